//! Lowers syntax trees into expression trees.
//!
//! The environment passed in is consulted only to decide whether a list
//! head is a locally bound variable, which shadows a same-named primitive;
//! no bindings are created during parsing. Fixed-arity primitives and the
//! shapes of special forms are checked here, so the evaluator only ever
//! sees well-formed trees. The numeric primitives dispatch to their binary
//! node when given exactly two operands and to the variadic node for any
//! other count.

use std::rc::Rc;

use crate::Error;
use crate::env::Env;
use crate::expr::{Expr, VariadicOp};
use crate::primitives::{self, PrimitiveKind, SpecialForm};
use crate::syntax::Syntax;

/// Lower one syntax tree to an expression tree.
pub fn parse(stx: &Syntax, env: &Env) -> Result<Expr, Error> {
    match stx {
        Syntax::Number(n) => Ok(Expr::Fixnum(*n)),
        Syntax::Rational(num, den) => Ok(Expr::Rational(*num, *den)),
        Syntax::Str(s) => Ok(Expr::StringLit(s.clone())),
        Syntax::True => Ok(Expr::True),
        Syntax::False => Ok(Expr::False),
        Syntax::Symbol(s) => Ok(Expr::Var(s.clone())),
        Syntax::List(items) => parse_list(items, env),
    }
}

fn parse_list(items: &[Syntax], env: &Env) -> Result<Expr, Error> {
    let [head, rands @ ..] = items else {
        // () is the quoted empty list
        return Ok(Expr::Quote(Syntax::List(Vec::new())));
    };

    if let Syntax::Symbol(op) = head {
        // A local binding shadows any primitive or reserved word of the
        // same name and turns the form into an ordinary application.
        if env.find(op).is_none() {
            if let Some(kind) = primitives::find_primitive(op) {
                return parse_primitive(op, kind, rands, env);
            }
            if let Some(form) = primitives::find_special_form(op) {
                return parse_special_form(op, form, rands, env);
            }
        }
    }

    parse_apply(head, rands, env)
}

fn parse_operands(rands: &[Syntax], env: &Env) -> Result<Vec<Expr>, Error> {
    rands.iter().map(|stx| parse(stx, env)).collect()
}

fn arity_error(op: &str) -> Error {
    Error::SyntaxError(format!("Wrong number of arguments for {op}"))
}

fn parse_primitive(
    op: &str,
    kind: PrimitiveKind,
    rands: &[Syntax],
    env: &Env,
) -> Result<Expr, Error> {
    let rands = parse_operands(rands, env)?;
    match kind {
        PrimitiveKind::Unary(unary) => {
            let [rand] = <[Expr; 1]>::try_from(rands).map_err(|_| arity_error(op))?;
            Ok(Expr::Unary(unary, Box::new(rand)))
        }
        PrimitiveKind::Binary(binary) => {
            let [rand1, rand2] = <[Expr; 2]>::try_from(rands).map_err(|_| arity_error(op))?;
            Ok(Expr::Binary(binary, Box::new(rand1), Box::new(rand2)))
        }
        PrimitiveKind::Numeric(binary, variadic) => match <[Expr; 2]>::try_from(rands) {
            Ok([rand1, rand2]) => Ok(Expr::Binary(binary, Box::new(rand1), Box::new(rand2))),
            Err(rands) => Ok(Expr::Variadic(variadic, rands)),
        },
        PrimitiveKind::List => Ok(Expr::Variadic(VariadicOp::List, rands)),
        PrimitiveKind::And => Ok(Expr::And(rands)),
        PrimitiveKind::Or => Ok(Expr::Or(rands)),
        PrimitiveKind::Void => {
            if !rands.is_empty() {
                return Err(arity_error(op));
            }
            Ok(Expr::MakeVoid)
        }
        PrimitiveKind::Exit => {
            if !rands.is_empty() {
                return Err(arity_error(op));
            }
            Ok(Expr::Exit)
        }
    }
}

fn parse_special_form(
    op: &str,
    form: SpecialForm,
    rands: &[Syntax],
    env: &Env,
) -> Result<Expr, Error> {
    match form {
        SpecialForm::Begin => Ok(Expr::Begin(parse_operands(rands, env)?)),

        SpecialForm::Quote => match rands {
            [quoted] => Ok(Expr::Quote(quoted.clone())),
            _ => Err(arity_error(op)),
        },

        SpecialForm::If => match rands {
            [cond, then, alt] => Ok(Expr::If {
                cond: Box::new(parse(cond, env)?),
                then: Box::new(parse(then, env)?),
                alt: Box::new(parse(alt, env)?),
            }),
            _ => Err(arity_error(op)),
        },

        SpecialForm::Cond => {
            let mut clauses = Vec::with_capacity(rands.len());
            for clause_stx in rands {
                let Syntax::List(parts) = clause_stx else {
                    return Err(Error::SyntaxError("cond clause must be a list".to_owned()));
                };
                // The else head stays a plain Var; the evaluator recognizes
                // it when the clause is reached.
                clauses.push(parse_operands(parts, env)?);
            }
            Ok(Expr::Cond(clauses))
        }

        SpecialForm::Lambda => {
            let [params_stx, body @ ..] = rands else {
                return Err(arity_error(op));
            };
            if body.is_empty() {
                return Err(arity_error(op));
            }
            let Syntax::List(param_stxs) = params_stx else {
                return Err(Error::SyntaxError(
                    "lambda parameters must be a list".to_owned(),
                ));
            };
            let params = symbol_names(param_stxs, "lambda parameter must be a symbol")?;
            Ok(Expr::Lambda {
                params: Rc::new(params),
                body: Rc::new(Expr::Begin(parse_operands(body, env)?)),
            })
        }

        SpecialForm::Define => {
            let [target, body @ ..] = rands else {
                return Err(arity_error(op));
            };
            if body.is_empty() {
                return Err(arity_error(op));
            }
            match target {
                // (define x e ...)
                Syntax::Symbol(name) => Ok(Expr::Define {
                    name: name.clone(),
                    body: Box::new(Expr::Begin(parse_operands(body, env)?)),
                }),
                // (define (f p ...) e ...) function shorthand
                Syntax::List(signature) => {
                    let [name_stx, param_stxs @ ..] = signature.as_slice() else {
                        return Err(Error::SyntaxError("Invalid define syntax".to_owned()));
                    };
                    let Syntax::Symbol(name) = name_stx else {
                        return Err(Error::SyntaxError(
                            "Function name must be a symbol".to_owned(),
                        ));
                    };
                    let params = symbol_names(param_stxs, "Function parameter must be a symbol")?;
                    Ok(Expr::Define {
                        name: name.clone(),
                        body: Box::new(Expr::Lambda {
                            params: Rc::new(params),
                            body: Rc::new(Expr::Begin(parse_operands(body, env)?)),
                        }),
                    })
                }
                _ => Err(Error::SyntaxError("Invalid define syntax".to_owned())),
            }
        }

        SpecialForm::Let | SpecialForm::Letrec => {
            let [bindings_stx, body @ ..] = rands else {
                return Err(arity_error(op));
            };
            if body.is_empty() {
                return Err(arity_error(op));
            }
            let bindings = parse_bindings(op, bindings_stx, env)?;
            let body = Box::new(Expr::Begin(parse_operands(body, env)?));
            Ok(match form {
                SpecialForm::Let => Expr::Let { bindings, body },
                _ => Expr::Letrec { bindings, body },
            })
        }

        SpecialForm::Set => match rands {
            [Syntax::Symbol(name), value] => Ok(Expr::Set {
                name: name.clone(),
                body: Box::new(parse(value, env)?),
            }),
            [_, _] => Err(Error::SyntaxError(
                "set! variable must be a symbol".to_owned(),
            )),
            _ => Err(arity_error(op)),
        },
    }
}

fn symbol_names(stxs: &[Syntax], error: &str) -> Result<Vec<String>, Error> {
    stxs.iter()
        .map(|stx| match stx {
            Syntax::Symbol(name) => Ok(name.clone()),
            _ => Err(Error::SyntaxError(error.to_owned())),
        })
        .collect()
}

fn parse_bindings(op: &str, stx: &Syntax, env: &Env) -> Result<Vec<(String, Expr)>, Error> {
    let Syntax::List(binding_stxs) = stx else {
        return Err(Error::SyntaxError(format!("{op} bindings must be a list")));
    };
    let mut bindings = Vec::with_capacity(binding_stxs.len());
    for binding in binding_stxs {
        let Syntax::List(parts) = binding else {
            return Err(Error::SyntaxError(format!("{op} binding must be a pair")));
        };
        let [name_stx, init] = parts.as_slice() else {
            return Err(Error::SyntaxError(format!("{op} binding must be a pair")));
        };
        let Syntax::Symbol(name) = name_stx else {
            return Err(Error::SyntaxError(format!("{op} variable must be a symbol")));
        };
        bindings.push((name.clone(), parse(init, env)?));
    }
    Ok(bindings)
}

fn parse_apply(head: &Syntax, rands: &[Syntax], env: &Env) -> Result<Expr, Error> {
    Ok(Expr::Apply {
        rator: Box::new(parse(head, env)?),
        rands: parse_operands(rands, env)?,
    })
}

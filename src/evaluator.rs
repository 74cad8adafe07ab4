use std::cmp::Ordering;
use std::rc::Rc;

use crate::Error;
use crate::arith;
use crate::env::Env;
use crate::expr::{BinaryOp, Expr, UnaryOp, VariadicOp};
use crate::primitives;
use crate::syntax::Syntax;
use crate::value::{Procedure, Value};

/// Evaluate an expression in an environment.
///
/// The environment is an in-out handle: `define` at any level mutates it,
/// which is how top-level definitions persist across REPL entries. All
/// operand evaluation is left to right; the order is observable through
/// `display`, `set!`, `set-car!`, and `set-cdr!` and is part of the
/// language's contract.
pub fn eval(expr: &Expr, env: &mut Env) -> Result<Value, Error> {
    match expr {
        Expr::Fixnum(n) => Ok(Value::Int(*n)),
        Expr::Rational(num, den) => Ok(Value::rational(*num, *den)),
        Expr::StringLit(s) => Ok(Value::string(s.as_str())),
        Expr::True => Ok(Value::Bool(true)),
        Expr::False => Ok(Value::Bool(false)),
        Expr::MakeVoid => Ok(Value::Void),
        Expr::Exit => Ok(Value::Terminate),

        Expr::Var(name) => eval_var(name, env),

        Expr::Unary(op, rand) => {
            let v = eval(rand, env)?;
            apply_unary(*op, &v)
        }
        Expr::Binary(op, rand1, rand2) => {
            let v1 = eval(rand1, env)?;
            let v2 = eval(rand2, env)?;
            apply_binary(*op, &v1, &v2)
        }
        Expr::Variadic(op, rands) => {
            let args = eval_operands(rands, env)?;
            apply_variadic(*op, args)
        }
        Expr::And(rands) => eval_and(rands, env),
        Expr::Or(rands) => eval_or(rands, env),

        Expr::If { cond, then, alt } => {
            if eval(cond, env)?.is_false() {
                eval(alt, env)
            } else {
                eval(then, env)
            }
        }
        Expr::Cond(clauses) => eval_cond(clauses, env),
        Expr::Begin(exprs) => eval_sequence(exprs, env),
        Expr::Quote(stx) => Ok(quoted_value(stx)),
        Expr::Lambda { params, body } => Ok(Value::Procedure(Rc::new(Procedure {
            params: Rc::clone(params),
            body: Rc::clone(body),
            env: env.clone(),
        }))),
        Expr::Apply { rator, rands } => eval_apply(rator, rands, env),
        Expr::Define { name, body } => eval_define(name, body, env),
        Expr::Let { bindings, body } => eval_let(bindings, body, env),
        Expr::Letrec { bindings, body } => eval_letrec(bindings, body, env),
        Expr::Set { name, body } => eval_set(name, body, env),
    }
}

fn eval_operands(rands: &[Expr], env: &mut Env) -> Result<Vec<Value>, Error> {
    rands.iter().map(|rand| eval(rand, env)).collect()
}

fn eval_sequence(exprs: &[Expr], env: &mut Env) -> Result<Value, Error> {
    let mut result = Value::Void;
    for expr in exprs {
        result = eval(expr, env)?;
    }
    Ok(result)
}

fn eval_var(name: &str, env: &Env) -> Result<Value, Error> {
    match env.find(name) {
        Some(value) => Ok(value),
        None => {
            if primitives::is_primitive(name) {
                // A bare primitive reference becomes a first-class value: a
                // zero-parameter closure whose body re-enters this lookup.
                // Applying it to arguments is an arity error against the
                // empty parameter list; see DESIGN.md.
                Ok(Value::Procedure(Rc::new(Procedure {
                    params: Rc::new(Vec::new()),
                    body: Rc::new(Expr::Var(name.to_owned())),
                    env: env.clone(),
                })))
            } else {
                Err(Error::UnboundVariable(name.to_owned()))
            }
        }
    }
}

/// Short-circuit conjunction: the first `#f` wins, otherwise the last
/// operand's value. Empty is `#t`.
fn eval_and(rands: &[Expr], env: &mut Env) -> Result<Value, Error> {
    let mut result = Value::Bool(true);
    for rand in rands {
        result = eval(rand, env)?;
        if result.is_false() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(result)
}

/// Short-circuit disjunction: the first non-`#f` value wins. Empty is `#f`.
fn eval_or(rands: &[Expr], env: &mut Env) -> Result<Value, Error> {
    for rand in rands {
        let result = eval(rand, env)?;
        if !result.is_false() {
            return Ok(result);
        }
    }
    Ok(Value::Bool(false))
}

fn eval_cond(clauses: &[Vec<Expr>], env: &mut Env) -> Result<Value, Error> {
    for clause in clauses {
        let [test, rest @ ..] = clause.as_slice() else {
            continue;
        };
        // The else clause is recognized here rather than in the parser, so
        // `else` cannot be shadowed as a variable inside cond.
        if matches!(test, Expr::Var(name) if name == "else") {
            return eval_sequence(rest, env);
        }
        let test_val = eval(test, env)?;
        if !test_val.is_false() {
            if rest.is_empty() {
                return Ok(test_val);
            }
            return eval_sequence(rest, env);
        }
    }
    Ok(Value::Void)
}

/// Materialize quoted syntax as a value tree. Atoms become their value
/// counterparts and lists become proper lists of right-nested pairs.
fn quoted_value(stx: &Syntax) -> Value {
    match stx {
        Syntax::Number(n) => Value::Int(*n),
        Syntax::Rational(num, den) => Value::rational(*num, *den),
        Syntax::Str(s) => Value::string(s.as_str()),
        Syntax::True => Value::Bool(true),
        Syntax::False => Value::Bool(false),
        Syntax::Symbol(s) => Value::Symbol(s.clone()),
        Syntax::List(items) => {
            let mut result = Value::Null;
            for item in items.iter().rev() {
                result = Value::pair(quoted_value(item), result);
            }
            result
        }
    }
}

fn eval_apply(rator: &Expr, rands: &[Expr], env: &mut Env) -> Result<Value, Error> {
    let rator_val = eval(rator, env)?;
    let Value::Procedure(procedure) = rator_val else {
        return Err(Error::TypeError(
            "Attempt to apply a non-procedure".to_owned(),
        ));
    };

    // Arguments are evaluated in the caller's environment and bound in the
    // procedure's captured environment.
    let args = eval_operands(rands, env)?;
    if args.len() != procedure.params.len() {
        return Err(Error::arity_error(procedure.params.len(), args.len()));
    }

    let mut call_env = procedure.env.clone();
    for (param, arg) in procedure.params.iter().zip(args) {
        call_env = call_env.extend(param.clone(), arg);
    }
    eval(&procedure.body, &mut call_env)
}

fn eval_define(name: &str, body: &Expr, env: &mut Env) -> Result<Value, Error> {
    if primitives::is_primitive(name) || primitives::is_reserved_word(name) {
        return Err(Error::EvalError(format!(
            "Cannot redefine primitive or reserved word: {name}"
        )));
    }

    let value = eval(body, env)?;

    // Re-defining an existing name mutates the binding in place, so every
    // closure sharing the frame sees the new value.
    if env.find(name).is_some() {
        env.modify(name, value);
    } else {
        *env = env.extend(name, value);
    }

    Ok(Value::Void)
}

fn eval_let(bindings: &[(String, Expr)], body: &Expr, env: &mut Env) -> Result<Value, Error> {
    // Binding initializers all run in the outer environment; they never
    // see each other.
    let mut values = Vec::with_capacity(bindings.len());
    for (_, init) in bindings {
        values.push(eval(init, env)?);
    }

    let mut body_env = env.clone();
    for ((name, _), value) in bindings.iter().zip(values) {
        body_env = body_env.extend(name.clone(), value);
    }
    eval(body, &mut body_env)
}

fn eval_letrec(bindings: &[(String, Expr)], body: &Expr, env: &mut Env) -> Result<Value, Error> {
    // First pass: bind every name to an unfilled placeholder so the
    // initializers can close over each other.
    let mut rec_env = env.clone();
    for (name, _) in bindings {
        rec_env = rec_env.extend_uninit(name.clone());
    }

    // Second pass: evaluate each initializer in the extended environment
    // and fill its binding.
    for (name, init) in bindings {
        let value = eval(init, &mut rec_env)?;
        rec_env.modify(name, value);
    }

    eval(body, &mut rec_env)
}

fn eval_set(name: &str, body: &Expr, env: &mut Env) -> Result<Value, Error> {
    // The value is evaluated before the target is checked, so its side
    // effects happen even when the set! fails.
    let value = eval(body, env)?;
    if env.find(name).is_none() {
        return Err(Error::EvalError(format!(
            "Undefined variable in set!: {name}"
        )));
    }
    env.modify(name, value);
    Ok(Value::Void)
}

fn apply_unary(op: UnaryOp, rand: &Value) -> Result<Value, Error> {
    match op {
        UnaryOp::Car => match rand {
            Value::Pair(cell) => Ok(cell.car.borrow().clone()),
            _ => Err(Error::TypeError("car: argument must be a pair".to_owned())),
        },
        UnaryOp::Cdr => match rand {
            Value::Pair(cell) => Ok(cell.cdr.borrow().clone()),
            _ => Err(Error::TypeError("cdr: argument must be a pair".to_owned())),
        },
        UnaryOp::Not => Ok(Value::Bool(rand.is_false())),
        UnaryOp::IsBoolean => Ok(Value::Bool(matches!(rand, Value::Bool(_)))),
        // number? answers true for fixnums only; rationals are excluded
        UnaryOp::IsNumber => Ok(Value::Bool(matches!(rand, Value::Int(_)))),
        UnaryOp::IsNull => Ok(Value::Bool(matches!(rand, Value::Null))),
        UnaryOp::IsPair => Ok(Value::Bool(matches!(rand, Value::Pair(_)))),
        UnaryOp::IsProcedure => Ok(Value::Bool(matches!(rand, Value::Procedure(_)))),
        UnaryOp::IsSymbol => Ok(Value::Bool(matches!(rand, Value::Symbol(_)))),
        UnaryOp::IsString => Ok(Value::Bool(matches!(rand, Value::Str(_)))),
        UnaryOp::IsList => Ok(Value::Bool(is_proper_list(rand))),
        UnaryOp::Display => {
            match rand {
                // Strings print their raw bytes; everything else prints in
                // canonical form.
                Value::Str(s) => print!("{s}"),
                other => print!("{other}"),
            }
            Ok(Value::Void)
        }
    }
}

/// Walk the cdr chain; a proper list ends in null. Cyclic chains built
/// with set-cdr! make this loop, matching the accepted source behavior.
fn is_proper_list(value: &Value) -> bool {
    let mut current = value.clone();
    loop {
        match current {
            Value::Null => return true,
            Value::Pair(cell) => {
                let next = cell.cdr.borrow().clone();
                current = next;
            }
            _ => return false,
        }
    }
}

fn apply_binary(op: BinaryOp, rand1: &Value, rand2: &Value) -> Result<Value, Error> {
    match op {
        BinaryOp::Add => arith::add(rand1, rand2),
        BinaryOp::Sub => arith::sub(rand1, rand2),
        BinaryOp::Mul => arith::mul(rand1, rand2),
        BinaryOp::Div => arith::div(rand1, rand2),
        BinaryOp::Modulo => arith::modulo(rand1, rand2),
        BinaryOp::Expt => arith::expt(rand1, rand2),
        BinaryOp::Less => compare_with(rand1, rand2, Ordering::is_lt),
        BinaryOp::LessEq => compare_with(rand1, rand2, Ordering::is_le),
        BinaryOp::NumEq => compare_with(rand1, rand2, Ordering::is_eq),
        BinaryOp::GreaterEq => compare_with(rand1, rand2, Ordering::is_ge),
        BinaryOp::Greater => compare_with(rand1, rand2, Ordering::is_gt),
        BinaryOp::Cons => Ok(Value::pair(rand1.clone(), rand2.clone())),
        BinaryOp::SetCar => match rand1 {
            Value::Pair(cell) => {
                *cell.car.borrow_mut() = rand2.clone();
                Ok(Value::Void)
            }
            _ => Err(Error::TypeError(
                "set-car!: first argument must be a pair".to_owned(),
            )),
        },
        BinaryOp::SetCdr => match rand1 {
            Value::Pair(cell) => {
                *cell.cdr.borrow_mut() = rand2.clone();
                Ok(Value::Void)
            }
            _ => Err(Error::TypeError(
                "set-cdr!: first argument must be a pair".to_owned(),
            )),
        },
        BinaryOp::IsEq => Ok(Value::Bool(eq_identity(rand1, rand2))),
    }
}

fn compare_with(
    rand1: &Value,
    rand2: &Value,
    test: fn(Ordering) -> bool,
) -> Result<Value, Error> {
    Ok(Value::Bool(test(arith::compare(rand1, rand2)?)))
}

/// eq? identity: small atoms compare by value, heap values by pointer.
/// Rationals are inline data here and compare by value.
fn eq_identity(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Rational(n1, d1), Value::Rational(n2, d2)) => n1 == n2 && d1 == d2,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
        (Value::Str(x), Value::Str(y)) => Rc::ptr_eq(x, y),
        (Value::Pair(x), Value::Pair(y)) => Rc::ptr_eq(x, y),
        (Value::Procedure(x), Value::Procedure(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

fn apply_variadic(op: VariadicOp, args: Vec<Value>) -> Result<Value, Error> {
    match op {
        VariadicOp::Add => match args.split_first() {
            None => Ok(Value::Int(0)),
            Some((first, rest)) => fold_numeric(first, rest, arith::add),
        },
        VariadicOp::Mul => match args.split_first() {
            None => Ok(Value::Int(1)),
            Some((first, rest)) => fold_numeric(first, rest, arith::mul),
        },
        VariadicOp::Sub => match args.split_first() {
            None => Err(Error::EvalError(
                "Wrong number of arguments for -".to_owned(),
            )),
            Some((only, [])) => arith::neg(only),
            Some((first, rest)) => fold_numeric(first, rest, arith::sub),
        },
        VariadicOp::Div => match args.split_first() {
            None => Err(Error::EvalError(
                "Wrong number of arguments for /".to_owned(),
            )),
            // (/ x) is 1/x
            Some((only, [])) => arith::div(&Value::Int(1), only),
            Some((first, rest)) => fold_numeric(first, rest, arith::div),
        },
        VariadicOp::Less => chain_compare(&args, Ordering::is_lt),
        VariadicOp::LessEq => chain_compare(&args, Ordering::is_le),
        VariadicOp::NumEq => chain_compare(&args, Ordering::is_eq),
        VariadicOp::GreaterEq => chain_compare(&args, Ordering::is_ge),
        VariadicOp::Greater => chain_compare(&args, Ordering::is_gt),
        VariadicOp::List => Ok(Value::list(args)),
    }
}

fn fold_numeric(
    first: &Value,
    rest: &[Value],
    op: fn(&Value, &Value) -> Result<Value, Error>,
) -> Result<Value, Error> {
    let mut result = first.clone();
    for arg in rest {
        result = op(&result, arg)?;
    }
    Ok(result)
}

/// Every adjacent pair must satisfy the comparison; fewer than two
/// arguments is vacuously true.
fn chain_compare(args: &[Value], test: fn(Ordering) -> bool) -> Result<Value, Error> {
    for window in args.windows(2) {
        if !test(arith::compare(&window[0], &window[1])?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

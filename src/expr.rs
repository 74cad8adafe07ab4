//! The typed expression tree, the parser's output and the evaluator's
//! input.
//!
//! Primitives are grouped by operand shape (unary, binary, variadic) with
//! an op enum per group; `and`/`or` keep dedicated variants because their
//! operands are not evaluated eagerly. Special forms each get their own
//! variant. The parser only ever produces well-formed trees: lambda bodies
//! are a single expression (multi-expression bodies arrive wrapped in
//! `Begin`), and let/letrec bindings are name/expression pairs.

use std::rc::Rc;

use crate::syntax::Syntax;
use crate::value::NumberType;

/// Primitives taking exactly one evaluated operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Car,
    Cdr,
    Not,
    IsBoolean,
    IsNumber,
    IsNull,
    IsPair,
    IsProcedure,
    IsSymbol,
    IsString,
    IsList,
    Display,
}

/// Primitives taking exactly two evaluated operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Modulo,
    Expt,
    Less,
    LessEq,
    NumEq,
    GreaterEq,
    Greater,
    Cons,
    SetCar,
    SetCdr,
    IsEq,
}

/// Primitives taking any number of eagerly evaluated operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariadicOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    LessEq,
    NumEq,
    GreaterEq,
    Greater,
    List,
}

/// One node of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    Fixnum(NumberType),
    Rational(NumberType, NumberType),
    StringLit(String),
    True,
    False,
    /// `(void)`
    MakeVoid,
    /// `(exit)`; evaluates to the terminate sentinel the REPL inspects
    Exit,

    /// Variable reference
    Var(String),

    // Primitive applications
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Variadic(VariadicOp, Vec<Expr>),
    /// Short-circuit conjunction; empty is `#t`
    And(Vec<Expr>),
    /// Short-circuit disjunction; empty is `#f`
    Or(Vec<Expr>),

    // Special forms
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        alt: Box<Expr>,
    },
    /// Clauses are non-empty expression sequences; an `else` head is
    /// recognized at evaluation time
    Cond(Vec<Vec<Expr>>),
    Begin(Vec<Expr>),
    /// Quoted syntax, materialized into a value when evaluated
    Quote(Syntax),
    /// Params and body are shared with the procedures closed over them
    Lambda {
        params: Rc<Vec<String>>,
        body: Rc<Expr>,
    },
    Apply {
        rator: Box<Expr>,
        rands: Vec<Expr>,
    },
    Define {
        name: String,
        body: Box<Expr>,
    },
    Let {
        bindings: Vec<(String, Expr)>,
        body: Box<Expr>,
    },
    Letrec {
        bindings: Vec<(String, Expr)>,
        body: Box<Expr>,
    },
    Set {
        name: String,
        body: Box<Expr>,
    },
}

//! Registry of primitive names and reserved words.
//!
//! The parser consults these tables to decide whether a list head is a
//! primitive application, a special form, or an ordinary application;
//! `define` consults them to refuse shadowing built-in names; the
//! evaluator consults them to promote bare primitive references to
//! first-class procedure values. Both tables are built once.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::expr::{BinaryOp, UnaryOp, VariadicOp};

/// How a primitive name maps onto expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrimitiveKind {
    /// Exactly one operand
    Unary(UnaryOp),
    /// Exactly two operands
    Binary(BinaryOp),
    /// Exactly two operands take the binary node, any other count the
    /// variadic one (including zero and one)
    Numeric(BinaryOp, VariadicOp),
    /// Any number of operands, evaluated eagerly
    List,
    /// Short-circuit forms, any number of operands
    And,
    Or,
    /// No operands
    Void,
    Exit,
}

/// Special forms. Reserved words parse to these and cannot be rebound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpecialForm {
    Begin,
    Quote,
    If,
    Cond,
    Lambda,
    Define,
    Let,
    Letrec,
    Set,
}

static PRIMITIVES: LazyLock<HashMap<&'static str, PrimitiveKind>> = LazyLock::new(|| {
    use PrimitiveKind::*;

    HashMap::from([
        // arithmetic
        ("+", Numeric(BinaryOp::Add, VariadicOp::Add)),
        ("-", Numeric(BinaryOp::Sub, VariadicOp::Sub)),
        ("*", Numeric(BinaryOp::Mul, VariadicOp::Mul)),
        ("/", Numeric(BinaryOp::Div, VariadicOp::Div)),
        ("modulo", Binary(BinaryOp::Modulo)),
        ("expt", Binary(BinaryOp::Expt)),
        // comparison
        ("<", Numeric(BinaryOp::Less, VariadicOp::Less)),
        ("<=", Numeric(BinaryOp::LessEq, VariadicOp::LessEq)),
        ("=", Numeric(BinaryOp::NumEq, VariadicOp::NumEq)),
        (">=", Numeric(BinaryOp::GreaterEq, VariadicOp::GreaterEq)),
        (">", Numeric(BinaryOp::Greater, VariadicOp::Greater)),
        // lists and pairs
        ("cons", Binary(BinaryOp::Cons)),
        ("car", Unary(UnaryOp::Car)),
        ("cdr", Unary(UnaryOp::Cdr)),
        ("list", List),
        ("set-car!", Binary(BinaryOp::SetCar)),
        ("set-cdr!", Binary(BinaryOp::SetCdr)),
        // predicates
        ("boolean?", Unary(UnaryOp::IsBoolean)),
        ("number?", Unary(UnaryOp::IsNumber)),
        ("null?", Unary(UnaryOp::IsNull)),
        ("pair?", Unary(UnaryOp::IsPair)),
        ("procedure?", Unary(UnaryOp::IsProcedure)),
        ("symbol?", Unary(UnaryOp::IsSymbol)),
        ("list?", Unary(UnaryOp::IsList)),
        ("string?", Unary(UnaryOp::IsString)),
        ("eq?", Binary(BinaryOp::IsEq)),
        // booleans
        ("not", Unary(UnaryOp::Not)),
        ("and", And),
        ("or", Or),
        // control and io
        ("void", Void),
        ("exit", Exit),
        ("display", Unary(UnaryOp::Display)),
    ])
});

static RESERVED_WORDS: LazyLock<HashMap<&'static str, SpecialForm>> = LazyLock::new(|| {
    use SpecialForm::*;

    HashMap::from([
        ("begin", Begin),
        ("quote", Quote),
        ("if", If),
        ("cond", Cond),
        ("lambda", Lambda),
        ("define", Define),
        ("let", Let),
        ("letrec", Letrec),
        ("set!", Set),
    ])
});

pub(crate) fn find_primitive(name: &str) -> Option<PrimitiveKind> {
    PRIMITIVES.get(name).copied()
}

pub(crate) fn find_special_form(name: &str) -> Option<SpecialForm> {
    RESERVED_WORDS.get(name).copied()
}

/// True if `name` names a built-in primitive.
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains_key(name)
}

/// True if `name` names a special form; such names cannot be rebound.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains_key(name)
}

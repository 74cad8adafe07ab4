//! minischeme - a small Scheme interpreter with exact rational arithmetic
//!
//! This crate implements the core of a Scheme dialect: a reader that turns
//! text into syntax trees, a parser that lowers syntax into a typed
//! expression tree, and an evaluator that walks expressions in a lexical
//! environment. Numbers are exact: machine integers plus normalized
//! rationals that collapse back to integers whenever the denominator
//! reaches 1.
//!
//! ```scheme
//! (+ 1/2 1/3)                          ; => 5/6
//! (define (fact n)
//!   (if (= n 0) 1 (* n (fact (- n 1)))))
//! (fact 5)                             ; => 120
//! (let ((p (cons 1 2))) (set-car! p 9) p) ; => (9 . 2)
//! ```
//!
//! ## Semantics in brief
//!
//! - Everything except `#f` is truthy, including `()`, `0`, and `""`.
//! - Pairs are the only mutable values; `set-car!`/`set-cdr!` mutate cells
//!   shared by every holder.
//! - `define` updates the caller's environment in place, so top-level
//!   definitions persist across REPL entries; `let` extension is persistent
//!   and never visible to older closures.
//! - Primitives referenced as bare variables are promoted to procedure
//!   values so they can be passed around; applying such a value to
//!   arguments is an arity error against its empty parameter list (a
//!   faithfully preserved quirk, see DESIGN.md).
//! - Evaluation recurses on the host stack; there is no tail-call
//!   optimization and no evaluation depth limit.
//!
//! ## Modules
//!
//! - `reader`: text to [`syntax::Syntax`] via nom combinators
//! - `parser`: syntax to [`expr::Expr`], with parse-time arity checks
//! - `evaluator`: expression evaluation producing [`value::Value`]
//! - `env`: lexical environments as chains of mutable-cell frames
//! - `arith`: exact integer/rational arithmetic and comparison
//! - `primitives`: the primitive and reserved-word name tables

use std::fmt;

/// Maximum reader nesting depth. Bounds recursion on hostile input; the
/// evaluator itself has no depth limit.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Categorizes the different kinds of reader failures.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the form was complete
    Incomplete,
    /// Nesting exceeded [`MAX_PARSE_DEPTH`]
    TooDeeplyNested,
    /// Extra input found after a complete, valid form
    TrailingContent,
}

/// A structured error describing a reader failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Snippet of the input around the failure point, if available
    pub context: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Attach a context snippet extracted from `input` around `error_offset`.
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 60;

        let start = error_offset.saturating_sub(20);
        let snippet: String = input.chars().skip(start).take(MAX_CONTEXT).collect();

        let mut context = String::new();
        if start > 0 {
            context.push_str("[...]");
        }
        context.push_str(&snippet);
        if start + snippet.len() < input.len() {
            context.push_str("[...]");
        }
        let context = context.replace('\n', "\\n").replace('\r', "");

        ParseError {
            kind,
            message: message.into(),
            context: Some(context),
        }
    }
}

/// Error types for the interpreter.
///
/// Runtime errors propagate unwound to the nearest boundary; the REPL is
/// the single recovery point and resumes after reporting. Mutations that
/// happened before a failure (environment writes, pair mutation) are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Reader could not produce a syntax tree
    ParseError(ParseError),
    /// Parser rejected a malformed form (shape or fixed arity)
    SyntaxError(String),
    /// Runtime failure: division by zero, overflow, redefinition, ...
    EvalError(String),
    /// A primitive received an argument of the wrong kind
    TypeError(String),
    /// Variable reference with no binding and no primitive fallback
    UnboundVariable(String),
    /// Procedure application with the wrong number of arguments
    ArityError { expected: usize, got: usize },
}

impl Error {
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError { expected, got }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => {
                write!(f, "Parse error: {}", e.message)?;
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::SyntaxError(msg) => write!(f, "Syntax error: {msg}"),
            Error::EvalError(msg) => write!(f, "{msg}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::UnboundVariable(name) => write!(f, "Undefined variable: {name}"),
            Error::ArityError { expected, got } => {
                write!(f, "Wrong number of arguments: expected {expected}, got {got}")
            }
        }
    }
}

pub mod arith;
pub mod env;
pub mod evaluator;
pub mod expr;
pub mod parser;
pub mod primitives;
pub mod reader;
pub mod syntax;
pub mod value;

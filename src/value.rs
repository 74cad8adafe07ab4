//! Runtime values produced by the evaluator.
//!
//! The main enum, [`Value`], covers all data types of the dialect: exact
//! integers and rationals, booleans, strings, symbols, the empty list,
//! mutable pairs, procedures, and the `void`/`terminate` sentinels. Values
//! are shared: any number of expressions, environments, and other values
//! may hold the same value, so heap-backed variants are reference counted.
//! Pairs are the only mutable kind; their car and cdr slots are interior-
//! mutable cells shared by every holder, which is what gives `set-car!`
//! and `set-cdr!` their observable effect.
//!
//! Equality here (`PartialEq`) is structural and exists for tests and
//! internal comparisons. The identity-flavored `eq?` primitive lives in
//! the evaluator.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::arith::gcd;
use crate::env::Env;
use crate::expr::Expr;

/// Type alias for machine integers in the interpreter
pub type NumberType = i64;

/// A cons cell. Both slots are mutable and shared.
pub struct PairCell {
    pub car: RefCell<Value>,
    pub cdr: RefCell<Value>,
}

/// A closure: parameter names, a single body expression, and the
/// environment captured when the `lambda` was evaluated.
pub struct Procedure {
    pub params: Rc<Vec<String>>,
    pub body: Rc<Expr>,
    pub env: Env,
}

/// Core runtime value type.
#[derive(Clone)]
pub enum Value {
    /// Exact machine-width integer
    Int(NumberType),
    /// Exact rational in lowest terms; denominator is always >= 2
    /// (denominator 1 collapses to `Int` on construction)
    Rational(NumberType, NumberType),
    Bool(bool),
    Str(Rc<String>),
    Symbol(String),
    /// The empty list
    Null,
    Pair(Rc<PairCell>),
    Procedure(Rc<Procedure>),
    /// Result of side-effecting forms; the REPL prints nothing for it
    Void,
    /// Sentinel returned by `(exit)`; the REPL shuts down when it sees one
    Terminate,
}

impl Value {
    /// Build a rational in lowest terms: gcd divided out, sign carried by
    /// the numerator, denominator 1 collapsing to an integer.
    pub fn rational(num: NumberType, den: NumberType) -> Value {
        let g = gcd(num, den);
        let (mut num, mut den) = if g != 0 { (num / g, den / g) } else { (num, den) };
        if den < 0 {
            num = -num;
            den = -den;
        }
        if den == 1 {
            Value::Int(num)
        } else {
            Value::Rational(num, den)
        }
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Rc::new(s.into()))
    }

    pub fn pair(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(PairCell {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }))
    }

    /// Proper list: right-nested pairs terminated by `Null`.
    pub fn list(elements: Vec<Value>) -> Value {
        let mut result = Value::Null;
        for element in elements.into_iter().rev() {
            result = Value::pair(element, result);
        }
        result
    }

    /// Only `#f` is false; every other value is truthy.
    pub(crate) fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }
}

// From trait implementations for Value - enables .into() conversion and
// keeps expected values in tests readable.

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as NumberType)
    }
}

impl From<NumberType> for Value {
    fn from(n: NumberType) -> Self {
        Value::Int(n)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::list(arr.into_iter().map(|x| x.into()).collect())
    }
}

/// Helper function for creating Values - works great in mixed lists!
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating symbols
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for the empty list
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Value {
    Value::Null
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Rational(num, den) => write!(f, "{num}/{den}"),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Str(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Null => write!(f, "()"),
            Value::Pair(cell) => {
                // (a b c) while the cdr chain stays proper, (a b . c) when
                // it ends in a non-null value
                write!(f, "({}", cell.car.borrow())?;
                let mut tail = cell.cdr.borrow().clone();
                loop {
                    match tail {
                        Value::Null => break,
                        Value::Pair(next) => {
                            write!(f, " {}", next.car.borrow())?;
                            let rest = next.cdr.borrow().clone();
                            tail = rest;
                        }
                        other => {
                            write!(f, " . {other}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Procedure(_) => write!(f, "#<procedure>"),
            Value::Void => write!(f, "#<void>"),
            Value::Terminate => write!(f, "#<terminate>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Rational(num, den) => write!(f, "Rational({num}/{den})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Null => write!(f, "Null"),
            Value::Pair(_) => write!(f, "Pair({self})"),
            Value::Procedure(p) => write!(f, "{p:?}"),
            Value::Void => write!(f, "Void"),
            Value::Terminate => write!(f, "Terminate"),
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Procedure(params={:?})", self.params)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Rational(n1, d1), Value::Rational(n2, d2)) => n1 == n2 && d1 == d2,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Void, Value::Void) => true,
            (Value::Terminate, Value::Terminate) => true,
            // Recurses through the cells; cyclic pairs are not handled here
            (Value::Pair(a), Value::Pair(b)) => {
                *a.car.borrow() == *b.car.borrow() && *a.cdr.borrow() == *b.cdr.borrow()
            }
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

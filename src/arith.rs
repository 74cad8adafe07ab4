//! Exact integer and rational arithmetic.
//!
//! Every binary helper accepts any mix of `Int` and `Rational`: both sides
//! are promoted to `(numerator, denominator)` form, the operation runs on
//! cross-multiplied terms, and the result goes through the normalizing
//! [`Value::rational`] constructor (lowest terms, positive denominator,
//! denominator 1 collapsing to `Int`).
//!
//! Arithmetic wraps at machine width. The one exception is `expt`, which
//! computes intermediates in i128 and reports overflow against the i64
//! range.

use std::cmp::Ordering;

use crate::Error;
use crate::value::{NumberType, Value};

/// Euclid's gcd. The sign of the result follows the inputs; callers fix
/// signs after dividing through.
pub(crate) fn gcd(a: NumberType, b: NumberType) -> NumberType {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Promote a numeric value to `(numerator, denominator)` form.
fn as_ratio(v: &Value, op: &str) -> Result<(NumberType, NumberType), Error> {
    match v {
        Value::Int(n) => Ok((*n, 1)),
        Value::Rational(num, den) => Ok((*num, *den)),
        _ => Err(Error::TypeError(format!("Wrong typename in {op}"))),
    }
}

pub fn add(v1: &Value, v2: &Value) -> Result<Value, Error> {
    let (n1, d1) = as_ratio(v1, "addition")?;
    let (n2, d2) = as_ratio(v2, "addition")?;
    Ok(Value::rational(
        n1.wrapping_mul(d2).wrapping_add(n2.wrapping_mul(d1)),
        d1.wrapping_mul(d2),
    ))
}

pub fn sub(v1: &Value, v2: &Value) -> Result<Value, Error> {
    let (n1, d1) = as_ratio(v1, "subtraction")?;
    let (n2, d2) = as_ratio(v2, "subtraction")?;
    Ok(Value::rational(
        n1.wrapping_mul(d2).wrapping_sub(n2.wrapping_mul(d1)),
        d1.wrapping_mul(d2),
    ))
}

pub fn mul(v1: &Value, v2: &Value) -> Result<Value, Error> {
    let (n1, d1) = as_ratio(v1, "multiplication")?;
    let (n2, d2) = as_ratio(v2, "multiplication")?;
    Ok(Value::rational(n1.wrapping_mul(n2), d1.wrapping_mul(d2)))
}

pub fn div(v1: &Value, v2: &Value) -> Result<Value, Error> {
    let (n1, d1) = as_ratio(v1, "division")?;
    let (n2, d2) = as_ratio(v2, "division")?;
    if n2 == 0 {
        return Err(Error::EvalError("Division by zero".to_owned()));
    }
    Ok(Value::rational(n1.wrapping_mul(d2), d1.wrapping_mul(n2)))
}

/// Unary minus: negate the integer, or the numerator of a rational.
pub fn neg(v: &Value) -> Result<Value, Error> {
    match v {
        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
        Value::Rational(num, den) => Ok(Value::rational(num.wrapping_neg(), *den)),
        _ => Err(Error::TypeError("Wrong typename in negation".to_owned())),
    }
}

/// Three-way numeric comparison by cross-multiplication. Denominators are
/// positive by construction, so the cross products keep the ordering.
pub fn compare(v1: &Value, v2: &Value) -> Result<Ordering, Error> {
    let (n1, d1) = as_ratio(v1, "numeric comparison")?;
    let (n2, d2) = as_ratio(v2, "numeric comparison")?;
    Ok(n1.wrapping_mul(d2).cmp(&n2.wrapping_mul(d1)))
}

/// Host-signed remainder; defined for two integers only.
pub fn modulo(v1: &Value, v2: &Value) -> Result<Value, Error> {
    match (v1, v2) {
        (Value::Int(dividend), Value::Int(divisor)) => {
            if *divisor == 0 {
                return Err(Error::EvalError("Division by zero".to_owned()));
            }
            Ok(Value::Int(dividend.wrapping_rem(*divisor)))
        }
        _ => Err(Error::TypeError(
            "modulo is only defined for integers".to_owned(),
        )),
    }
}

/// Integer exponentiation by squaring. Intermediates run in i128 and any
/// excursion past the i64 range is an overflow error.
pub fn expt(v1: &Value, v2: &Value) -> Result<Value, Error> {
    let (Value::Int(base), Value::Int(exponent)) = (v1, v2) else {
        return Err(Error::TypeError(
            "expt is only defined for integers".to_owned(),
        ));
    };
    if *exponent < 0 {
        return Err(Error::EvalError(
            "Negative exponent not supported for integers".to_owned(),
        ));
    }
    if *base == 0 && *exponent == 0 {
        return Err(Error::EvalError("0^0 is undefined".to_owned()));
    }

    let overflow = || Error::EvalError("Integer overflow in expt".to_owned());
    let in_range = |x: i128| x <= NumberType::MAX as i128 && x >= NumberType::MIN as i128;

    let mut result: i128 = 1;
    let mut b = *base as i128;
    let mut exp = *exponent;
    while exp > 0 {
        if exp % 2 == 1 {
            result *= b;
            if !in_range(result) {
                return Err(overflow());
            }
        }
        b *= b;
        if !in_range(b) && exp > 1 {
            return Err(overflow());
        }
        exp /= 2;
    }

    Ok(Value::Int(result as NumberType))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::val;

    type BinOp = fn(&Value, &Value) -> Result<Value, Error>;

    #[test]
    fn test_rational_arithmetic() {
        let test_cases: Vec<(BinOp, Value, Value, Value)> = vec![
            // Int + Int
            (add, val(1), val(2), val(3)),
            (sub, val(1), val(2), val(-1)),
            (mul, val(3), val(4), val(12)),
            // Rational + Rational
            (add, Value::rational(1, 2), Value::rational(1, 3), Value::rational(5, 6)),
            (sub, Value::rational(1, 2), Value::rational(1, 2), val(0)),
            (mul, Value::rational(2, 3), Value::rational(3, 4), Value::rational(1, 2)),
            // Mixed
            (add, val(1), Value::rational(1, 2), Value::rational(3, 2)),
            (mul, val(2), Value::rational(1, 2), val(1)),
            (sub, Value::rational(3, 2), val(1), Value::rational(1, 2)),
            // Division collapses and expands as needed
            (div, val(6), val(4), Value::rational(3, 2)),
            (div, val(6), val(3), val(2)),
            (div, val(1), Value::rational(1, 2), val(2)),
            (div, Value::rational(1, 2), Value::rational(1, 4), val(2)),
            (div, val(-6), val(4), Value::rational(-3, 2)),
        ];

        for (i, (op, v1, v2, expected)) in test_cases.iter().enumerate() {
            let result = op(v1, v2).unwrap();
            assert_eq!(result, *expected, "case #{}: {v1:?}, {v2:?}", i + 1);
        }
    }

    #[test]
    fn test_arithmetic_type_and_zero_errors() {
        assert!(matches!(add(&val(1), &val(true)), Err(Error::TypeError(_))));
        assert!(matches!(mul(&val("x"), &val(1)), Err(Error::TypeError(_))));
        assert!(matches!(div(&val(1), &val(0)), Err(Error::EvalError(_))));
        assert!(matches!(
            div(&val(1), &Value::rational(0, 1)),
            Err(Error::EvalError(_))
        ));
        // 0/0 hits the zero-divisor check, nothing more specific
        assert!(matches!(div(&val(0), &val(0)), Err(Error::EvalError(_))));
    }

    #[test]
    fn test_wrapping_at_machine_width() {
        // only expt detects overflow; everything else wraps
        assert_eq!(
            add(&val(NumberType::MAX), &val(1)).unwrap(),
            val(NumberType::MIN)
        );
        assert_eq!(neg(&val(NumberType::MIN)).unwrap(), val(NumberType::MIN));
    }

    #[test]
    fn test_negation() {
        assert_eq!(neg(&val(5)).unwrap(), val(-5));
        assert_eq!(neg(&Value::rational(1, 2)).unwrap(), Value::rational(-1, 2));
        assert!(neg(&val(false)).is_err());
    }

    #[test]
    fn test_comparison() {
        let test_cases = vec![
            (val(1), val(2), Ordering::Less),
            (val(2), val(2), Ordering::Equal),
            (val(3), val(2), Ordering::Greater),
            (Value::rational(1, 2), Value::rational(2, 3), Ordering::Less),
            (Value::rational(1, 2), val(1), Ordering::Less),
            (val(1), Value::rational(1, 2), Ordering::Greater),
            (Value::rational(2, 4), Value::rational(1, 2), Ordering::Equal),
            (Value::rational(-1, 2), val(0), Ordering::Less),
        ];

        for (v1, v2, expected) in test_cases {
            assert_eq!(compare(&v1, &v2).unwrap(), expected, "{v1:?} vs {v2:?}");
        }

        assert!(compare(&val(1), &val(true)).is_err());
    }

    #[test]
    fn test_modulo() {
        assert_eq!(modulo(&val(7), &val(3)).unwrap(), val(1));
        // host-signed remainder keeps the dividend's sign
        assert_eq!(modulo(&val(-7), &val(3)).unwrap(), val(-1));
        assert_eq!(modulo(&val(7), &val(-3)).unwrap(), val(1));
        assert!(matches!(
            modulo(&val(7), &val(0)),
            Err(Error::EvalError(_))
        ));
        assert!(matches!(
            modulo(&Value::rational(1, 2), &val(3)),
            Err(Error::TypeError(_))
        ));
    }

    #[test]
    fn test_expt() {
        assert_eq!(expt(&val(2), &val(10)).unwrap(), val(1024));
        assert_eq!(expt(&val(2), &val(0)).unwrap(), val(1));
        assert_eq!(expt(&val(0), &val(5)).unwrap(), val(0));
        assert_eq!(expt(&val(-2), &val(3)).unwrap(), val(-8));
        assert_eq!(expt(&val(1), &val(1000000)).unwrap(), val(1));
        assert_eq!(expt(&val(2), &val(62)).unwrap(), val(1_i64 << 62));

        let overflow = expt(&val(2), &val(64)).unwrap_err();
        assert!(format!("{overflow}").contains("Integer overflow"));
        assert!(expt(&val(10), &val(1000)).is_err());

        assert!(matches!(expt(&val(2), &val(-1)), Err(Error::EvalError(_))));
        assert!(matches!(expt(&val(0), &val(0)), Err(Error::EvalError(_))));
        assert!(matches!(
            expt(&Value::rational(1, 2), &val(2)),
            Err(Error::TypeError(_))
        ));
    }
}

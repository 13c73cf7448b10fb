//! The dynamic value type every stack slot holds.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use std::fmt;

/// A value on an Aceto stack.
///
/// The reference language is dynamically typed; this is the closed sum type
/// that stands in for it. Each command documents how it coerces the variants
/// it doesn't directly accept.
#[derive(Debug, Clone)]
pub enum Value {
    /// Arbitrary-precision signed integer.
    Integer(BigInt),
    /// IEEE-754 double.
    Float(f64),
    /// A sequence of Unicode scalar values.
    Str(String),
    /// True or false.
    Bool(bool),
}

impl Value {
    /// Shorthand for a small integer literal.
    pub fn int(v: i64) -> Self {
        Value::Integer(BigInt::from(v))
    }

    /// 0, 0.0, the empty string, and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(i) => !i.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }

    /// Coerces to an integer: parses strings, truncates floats, 0/1 for
    /// booleans. Unparsable strings and non-finite floats coerce to zero,
    /// matching the `i` cast's documented failure behavior.
    pub fn to_integer(&self) -> BigInt {
        match self {
            Value::Integer(i) => i.clone(),
            Value::Float(f) => {
                if f.is_finite() {
                    BigInt::from_f64(f.trunc()).unwrap_or_else(BigInt::zero)
                } else {
                    BigInt::zero()
                }
            }
            Value::Bool(b) => BigInt::from(*b as i64),
            Value::Str(s) => s.trim().parse::<BigInt>().unwrap_or_else(|_| BigInt::zero()),
        }
    }

    /// Coerces to a float: parses strings, 0.0/1.0 for booleans. Unparsable
    /// strings coerce to zero, matching the `f` cast's documented failure
    /// behavior.
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Integer(i) => i.to_f64().unwrap_or(f64::NAN),
            Value::Float(f) => *f,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Str(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        }
    }

    /// Numeric coercion used by arithmetic and comparison operators: leaves
    /// `Integer`/`Float` alone, maps `Bool` to 0/1, and parses `Str` as an
    /// integer, falling back to a float, falling back to zero.
    pub fn to_numeric(&self) -> Value {
        match self {
            Value::Integer(_) | Value::Float(_) => self.clone(),
            Value::Bool(b) => Value::int(*b as i64),
            Value::Str(s) => {
                let t = s.trim();
                if let Ok(i) = t.parse::<BigInt>() {
                    Value::Integer(i)
                } else if let Ok(f) = t.parse::<f64>() {
                    Value::Float(f)
                } else {
                    Value::int(0)
                }
            }
        }
    }

    /// The textual form used by `p`, `B`, and the `∑` cast.
    pub fn display_string(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => {
                if *b {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }
        }
    }

    /// A short, human-readable name of the variant, used in type-mismatch
    /// diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Bool(_) => "Boolean",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if f == f.trunc() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// `=`: value equality within a case; numeric equality across Integer/Float.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
            x.to_f64().unwrap_or(f64::NAN) == *y
        }
        _ => false,
    }
}

/// Numeric ordering used by `m` (greater) and `w` (less-or-equal), after
/// coercing both sides with [`Value::to_numeric`].
pub fn numeric_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a.to_numeric(), b.to_numeric()) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(&y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        (Value::Integer(x), Value::Float(y)) => {
            x.to_f64().unwrap_or(f64::NAN).partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal)
        }
        (Value::Float(x), Value::Integer(y)) => {
            x.partial_cmp(&y.to_f64().unwrap_or(f64::NAN)).unwrap_or(std::cmp::Ordering::Equal)
        }
        _ => unreachable!("to_numeric always returns Integer or Float"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::int(0).is_truthy());
        assert!(Value::int(1).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Str("0".to_string()).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
    }

    #[test]
    fn numeric_equality_crosses_cases() {
        assert!(values_equal(&Value::int(2), &Value::Float(2.0)));
        assert!(!values_equal(&Value::int(2), &Value::Str("2".to_string())));
    }

    #[test]
    fn float_display_keeps_trailing_point_zero() {
        assert_eq!(Value::Float(2.0).display_string(), "2.0");
        assert_eq!(Value::Float(2.5).display_string(), "2.5");
    }

    #[test]
    fn string_cast_failure_falls_back_to_zero() {
        assert_eq!(Value::Str("nope".to_string()).to_integer(), BigInt::zero());
        assert_eq!(Value::Str("nope".to_string()).to_float(), 0.0);
    }
}

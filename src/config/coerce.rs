//! Type coercion of raw string values into typed leaf values.

use crate::types::{LeafType, Value};
use std::num::IntErrorKind;

/// Convert `raw` into a value of type `ty`.
///
/// Pure and total: every input yields either a value or a reason string.
/// Range constraints are the validator's concern, not this function's.
pub fn coerce(raw: &str, ty: LeafType) -> Result<Value, String> {
    match ty {
        LeafType::Bool => parse_bool(raw).map(Value::Bool),
        LeafType::Int => parse_int(raw).map(Value::Int),
        LeafType::Float => parse_float(raw).map(Value::Float),
        LeafType::String => Ok(Value::String(raw.to_string())),
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err("expected one of true/false, 1/0, yes/no".to_string()),
    }
}

fn parse_int(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            "out of range for a 64-bit integer".to_string()
        }
        IntErrorKind::Empty => "empty value".to_string(),
        _ => "not an integer".to_string(),
    })
}

fn parse_float(raw: &str) -> Result<f64, String> {
    let value = raw
        .parse::<f64>()
        .map_err(|_| "not a number".to_string())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("out of range for a 64-bit float".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_truthy_and_falsy_spellings() {
        for raw in ["true", "1", "yes", "TRUE", "Yes"] {
            assert_eq!(coerce(raw, LeafType::Bool), Ok(Value::Bool(true)), "{raw}");
        }
        for raw in ["false", "0", "no", "False", "NO"] {
            assert_eq!(coerce(raw, LeafType::Bool), Ok(Value::Bool(false)), "{raw}");
        }
    }

    #[test]
    fn test_bool_rejects_other_words() {
        assert!(coerce("maybe", LeafType::Bool).is_err());
        assert!(coerce("", LeafType::Bool).is_err());
        assert!(coerce("on", LeafType::Bool).is_err());
    }

    #[test]
    fn test_int_parse() {
        assert_eq!(coerce("42", LeafType::Int), Ok(Value::Int(42)));
        assert_eq!(coerce("-7", LeafType::Int), Ok(Value::Int(-7)));
        assert_eq!(coerce("abc", LeafType::Int), Err("not an integer".to_string()));
        assert!(coerce("4.2", LeafType::Int).is_err());
        assert!(coerce(" 42", LeafType::Int).is_err());
    }

    #[test]
    fn test_int_out_of_range() {
        let err = coerce("99999999999999999999", LeafType::Int).unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn test_float_parse() {
        assert_eq!(coerce("0.75", LeafType::Float), Ok(Value::Float(0.75)));
        assert_eq!(coerce("3", LeafType::Float), Ok(Value::Float(3.0)));
        assert!(coerce("fast", LeafType::Float).is_err());
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(coerce("1e999", LeafType::Float).is_err());
        assert!(coerce("inf", LeafType::Float).is_err());
        assert!(coerce("NaN", LeafType::Float).is_err());
    }

    #[test]
    fn test_string_passthrough() {
        assert_eq!(
            coerce("  Mixed Case  ", LeafType::String),
            Ok(Value::String("  Mixed Case  ".into()))
        );
        assert_eq!(coerce("", LeafType::String), Ok(Value::String(String::new())));
    }
}

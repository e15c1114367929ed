//! Runtime value helpers.
//!
//! Formula values are plain [`serde_json::Value`]s so results drop straight
//! into a value map. Numbers are computed as `f64` and emitted as integers
//! when they are integral.

use serde_json::{Number, Value};

use crate::error::EvalError;

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Converts a computed number back into a JSON value.
///
/// Non-finite results are an error so `NaN` and infinities never reach a
/// value map.
pub fn number(n: f64) -> Result<Value, EvalError> {
    if !n.is_finite() {
        return Err(EvalError::NonFinite);
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        // -0.0 collapses to 0
        return Ok(Value::from(n as i64));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or(EvalError::NonFinite)
}

/// Numeric view of a value, if it is a number.
pub fn as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// `null`, `false`, `0` and `""` are falsy; everything else is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form used by string concatenation.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Structural equality without coercion. Numbers compare by value so
/// `2` and `2.0` are equal.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| loose_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Type name shown in mismatch messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_numbers_become_integers() {
        assert_eq!(number(20.0).unwrap(), json!(20));
        assert_eq!(number(-0.0).unwrap(), json!(0));
        assert_eq!(number(2.5).unwrap(), json!(2.5));
        assert_eq!(number(f64::INFINITY), Err(EvalError::NonFinite));
        assert_eq!(number(f64::NAN), Err(EvalError::NonFinite));
    }

    #[test]
    fn truthiness() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!truthy(&v), "{} should be falsy", v);
        }
        for v in [json!(true), json!(1), json!("0"), json!([]), json!({})] {
            assert!(truthy(&v), "{} should be truthy", v);
        }
    }

    #[test]
    fn stringify_forms() {
        assert_eq!(stringify(&json!(3.0)), "3");
        assert_eq!(stringify(&json!(3.25)), "3.25");
        assert_eq!(stringify(&json!(["a", 1, true])), "a,1,true");
        assert_eq!(stringify(&json!(null)), "null");
    }

    #[test]
    fn equality_is_structural() {
        assert!(loose_eq(&json!(2), &json!(2.0)));
        assert!(!loose_eq(&json!(1), &json!("1")));
        assert!(loose_eq(&json!(["a", 1]), &json!(["a", 1.0])));
        assert!(!loose_eq(&json!(null), &json!(false)));
    }
}

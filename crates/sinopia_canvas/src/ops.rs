//! Operator semantics: coercions, equality and arithmetic on [`Value`]s.

use std::cmp::Ordering;

use sinopia_armature::expression::BinaryOp;
use sinopia_carton::format_compact;
use sinopia_tempera::Value;

use crate::error::{EvalError, EvalResult};

/// `Number(value)`.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Array(_) => string_to_number(&value.to_string()),
        Value::Object(_) | Value::Function(_) => f64::NAN,
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    let (sign, unsigned) = match s.as_bytes()[0] {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    let radix = match unsigned.get(..2) {
        Some("0x" | "0X") if sign > 0.0 && s == unsigned => Some(16),
        Some("0o" | "0O") if sign > 0.0 && s == unsigned => Some(8),
        Some("0b" | "0B") if sign > 0.0 && s == unsigned => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&unsigned[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    // Rust also accepts "inf" and "nan"
    if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    unsigned.parse::<f64>().map(|n| sign * n).unwrap_or(f64::NAN)
}

/// ToInt32.
pub fn to_int32(value: &Value) -> i32 {
    to_uint32(value) as i32
}

/// ToUint32.
pub fn to_uint32(value: &Value) -> u32 {
    let n = to_number(value);
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Null | Value::Array(_) | Value::Object(_) => "object",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Function(_) => "function",
    }
}

/// `===`: NaN is unequal to itself, containers compare by identity.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => a.same_value(b),
    }
}

/// `==`.
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (Value::Bool(_), _) => loose_equals(&Value::Number(to_number(a)), b),
        (_, Value::Bool(_)) => loose_equals(a, &Value::Number(to_number(b))),
        (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::String(_)) => {
            loose_equals(&Value::from(a.to_string().as_str()), b)
        }
        (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_)) => {
            loose_equals(a, &Value::from(b.to_string().as_str()))
        }
        _ => strict_equals(a, b),
    }
}

fn is_string_like(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_)
    )
}

/// `a + b`: string concatenation once either side is not numeric.
pub fn add(a: &Value, b: &Value) -> Value {
    if is_string_like(a) || is_string_like(b) {
        Value::String(format_compact!("{}{}", a, b))
    } else {
        Value::Number(to_number(a) + to_number(b))
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    let primitive = |v: &Value| match v {
        Value::Array(_) | Value::Object(_) | Value::Function(_) => Value::from(v.to_string().as_str()),
        other => other.clone(),
    };
    match (primitive(a), primitive(b)) {
        (Value::String(x), Value::String(y)) => Some(x.as_str().cmp(y.as_str())),
        (x, y) => to_number(&x).partial_cmp(&to_number(&y)),
    }
}

fn shift_count(value: &Value) -> u32 {
    to_uint32(value) & 31
}

/// Apply a binary operator to two evaluated operands.
pub fn binary(op: BinaryOp, a: &Value, b: &Value) -> EvalResult<Value> {
    let number = |n: f64| Ok(Value::Number(n));
    match op {
        BinaryOp::Add => Ok(add(a, b)),
        BinaryOp::Sub => number(to_number(a) - to_number(b)),
        BinaryOp::Mul => number(to_number(a) * to_number(b)),
        BinaryOp::Div => number(to_number(a) / to_number(b)),
        BinaryOp::Rem => number(to_number(a) % to_number(b)),
        BinaryOp::Exp => number(to_number(a).powf(to_number(b))),
        BinaryOp::Eq => Ok(Value::Bool(loose_equals(a, b))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_equals(a, b))),
        BinaryOp::StrictEq => Ok(Value::Bool(strict_equals(a, b))),
        BinaryOp::StrictNotEq => Ok(Value::Bool(!strict_equals(a, b))),
        BinaryOp::Lt => Ok(Value::Bool(compare(a, b) == Some(Ordering::Less))),
        BinaryOp::Gt => Ok(Value::Bool(compare(a, b) == Some(Ordering::Greater))),
        BinaryOp::LtEq => Ok(Value::Bool(matches!(
            compare(a, b),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::GtEq => Ok(Value::Bool(matches!(
            compare(a, b),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinaryOp::In => has_property(b, &a.to_string()).map(Value::Bool),
        BinaryOp::InstanceOf => Err(EvalError::Unsupported("instanceof".into())),
        BinaryOp::BitAnd => number(f64::from(to_int32(a) & to_int32(b))),
        BinaryOp::BitOr => number(f64::from(to_int32(a) | to_int32(b))),
        BinaryOp::BitXor => number(f64::from(to_int32(a) ^ to_int32(b))),
        BinaryOp::Shl => number(f64::from(to_int32(a).wrapping_shl(shift_count(b)))),
        BinaryOp::Shr => number(f64::from(to_int32(a).wrapping_shr(shift_count(b)))),
        BinaryOp::UShr => number(f64::from(to_uint32(a).wrapping_shr(shift_count(b)))),
    }
}

/// `key in target`.
pub fn has_property(target: &Value, key: &str) -> EvalResult<bool> {
    match target {
        Value::Object(obj) => Ok(obj.contains_key(key)),
        Value::Array(arr) => Ok(key == "length" || array_index(key).is_some_and(|i| i < arr.len())),
        other => Err(EvalError::type_error(format_compact!(
            "Cannot use 'in' operator to search for '{}' in {}",
            key,
            other
        ))),
    }
}

/// A canonical array index (`"0"`, `"12"`, not `"01"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

/// A property key as JS would stringify it.
pub fn property_key(value: &Value) -> sinopia_carton::String {
    match value {
        Value::String(s) => s.clone(),
        other => format_compact!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&Value::from(" 42 ")), 42.0);
        assert_eq!(to_number(&Value::from("")), 0.0);
        assert_eq!(to_number(&Value::from("0x1f")), 31.0);
        assert_eq!(to_number(&Value::from("-Infinity")), f64::NEG_INFINITY);
        assert!(to_number(&Value::from("inf")).is_nan());
        assert!(to_number(&Value::from("12px")).is_nan());
        assert_eq!(to_number(&Value::Null), 0.0);
        assert_eq!(to_number(&Value::Bool(true)), 1.0);
        assert!(to_number(&Value::Undefined).is_nan());
        assert_eq!(to_number(&Value::from(vec![Value::from(7)])), 7.0);
    }

    #[test]
    fn test_equality() {
        assert!(loose_equals(&Value::Null, &Value::Undefined));
        assert!(!loose_equals(&Value::Null, &Value::from(0)));
        assert!(loose_equals(&Value::from("1"), &Value::from(1)));
        assert!(loose_equals(&Value::Bool(true), &Value::from("1")));
        assert!(loose_equals(&Value::from(vec![Value::from(1)]), &Value::from("1")));
        assert!(!strict_equals(&Value::from("1"), &Value::from(1)));
        assert!(!strict_equals(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn test_binary() {
        let add = |a: Value, b: Value| binary(BinaryOp::Add, &a, &b).unwrap();
        assert_eq!(add(1.into(), 2.into()), Value::from(3));
        assert_eq!(add("a".into(), 1.into()), Value::from("a1"));
        assert_eq!(add(Value::Null, 1.into()), Value::from(1));
        assert_eq!(add(Value::from(Vec::<Value>::new()), Value::Undefined), Value::from("undefined"));
        let lt = binary(BinaryOp::Lt, &"10".into(), &"9".into()).unwrap();
        assert_eq!(lt, Value::Bool(true));
        let lt = binary(BinaryOp::Lt, &10.into(), &"9".into()).unwrap();
        assert_eq!(lt, Value::Bool(false));
        let shr = binary(BinaryOp::UShr, &Value::from(-1), &Value::from(28)).unwrap();
        assert_eq!(shr, Value::from(15));
        assert!(binary(BinaryOp::In, &"a".into(), &1.into()).is_err());
    }
}

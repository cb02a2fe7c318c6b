//! Lenient field deserializers
//!
//! The Grocy API has served ids, factors and flags both as JSON numbers and
//! as strings, and optional ids as `null` or `""`.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Required integer id
pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(d)?;
    value_as_i64(&v).ok_or_else(|| D::Error::custom(format!("expected integer id, got {}", v)))
}

/// Optional integer id; null, empty or non-numeric strings are `None`
pub fn optional_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(value_as_i64(&v))
}

/// Required float
pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Value::deserialize(d)?;
    value_as_f64(&v).ok_or_else(|| D::Error::custom(format!("expected number, got {}", v)))
}

fn number_or<'de, D: Deserializer<'de>>(d: D, fallback: f64) -> Result<f64, D::Error> {
    let v = Value::deserialize(d)?;
    if v.is_null() {
        return Ok(fallback);
    }
    value_as_f64(&v).ok_or_else(|| D::Error::custom(format!("expected number, got {}", v)))
}

/// Amount; `null` reads as 0 (pair with `#[serde(default)]` for absent fields)
pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    number_or(d, 0.0)
}

/// Unit factor; `null` reads as 1
pub fn factor_or_one<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    number_or(d, 1.0)
}

/// Boolean that may arrive as `true`, `1` or `"1"`
pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let v = Value::deserialize(d)?;
    match v {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        other => value_as_i64(&other)
            .map(|n| n != 0)
            .ok_or_else(|| D::Error::custom(format!("expected flag, got {}", other))),
    }
}

pub fn empty_string_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let s = Option::<String>::deserialize(d)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Typed values of one stage, keyed by field name.
pub type StageValues = AHashMap<String, Value>;

/// Recorded stage values, keyed by stage id.
pub type Snapshots = AHashMap<String, StageValues>;

/// Untyped values as submitted by a form, keyed by field name.
pub type RawValues = AHashMap<String, serde_json::Value>;

/// A typed field value recorded in a stage snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Dates are kept exactly as submitted.
    Date(String),
}

// Manual implementation to handle f64
impl Eq for Value {}

// Manual implementation to handle f64 by hashing its bits
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) | Value::Date(s) => s.hash(state),
            Value::Number(n) => n.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
        }
    }
}

impl Value {
    /// Converts the value back into the raw JSON shape a form would submit.
    pub fn to_raw(&self) -> serde_json::Value {
        match self {
            Value::Text(s) | Value::Date(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) | Value::Date(s) => write!(f, "\"{}\"", s),
        }
    }
}

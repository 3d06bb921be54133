mod expression;
mod predicate;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_derive::{Deserialize, Serialize};

pub use predicate::Predicate;

/// A record: a schemaless mapping from field name to value.
pub type Record = BTreeMap<String, Value>;

/// A specific value of a field. Serialized as plain JSON, so timestamps round-trip
/// through the snapshot as text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(String),
    List(Vec<Value>),
}

impl Value {
    /// The current instant as an ISO-8601 timestamp with millisecond precision.
    pub fn now() -> Self {
        Value::Timestamp(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string content of a textual value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Timestamp(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces the value to a number. Null and false are 0, true is 1, text is parsed after
    /// trimming (empty text is 0), and anything unparseable is NaN.
    pub fn number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(b) => *b as u8 as f64,
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) | Value::Timestamp(s) => match s.trim() {
                "" => 0.0,
                s => s.parse().unwrap_or(f64::NAN),
            },
            Value::List(_) => f64::NAN,
        }
    }

    /// Interprets the value as an instant in epoch milliseconds. Numbers are taken as-is and
    /// text is parsed as an RFC 3339 timestamp.
    pub fn epoch_millis(&self) -> f64 {
        match self {
            Value::Text(s) | Value::Timestamp(s) => match DateTime::parse_from_rfc3339(s.trim()) {
                Ok(ts) => ts.timestamp_millis() as f64,
                Err(_) => self.number(),
            },
            v => v.number(),
        }
    }

    /// Strict equality as used by key matching and `=` comparisons. Integers and floats
    /// compare as numbers, text and timestamps compare as strings.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                self.number() == other.number()
            }
            (Value::Text(a) | Value::Timestamp(a), Value::Text(b) | Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.same_as(b))
            }
            _ => false,
        }
    }

    /// Builds a numeric value, keeping integral results as integers.
    pub fn from_number(n: f64) -> Self {
        if n.fract() == 0.0 && n.is_finite() && n.abs() < i64::MAX as f64 {
            Value::Integer(n as i64)
        } else {
            Value::Float(n)
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) | Value::Timestamp(s) => f.write_str(s),
            Value::List(items) => {
                let items = items.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                write!(f, "{{{}}}", items.join(","))
            }
        }
    }
}

/// Orders two field values for ORDER BY. Strings compare case-insensitively, everything else
/// compares numerically with missing values treated as 0.
pub fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (
            Some(Value::Text(a) | Value::Timestamp(a)),
            Some(Value::Text(b) | Value::Timestamp(b)),
        ) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            // lowercase sorts first on ties
            .then_with(|| b.cmp(a)),
        (a, b) => {
            let a = a.map(Value::number).unwrap_or(0.0);
            let b = b.map(Value::number).unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::from_number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Builds a positional parameter list from anything convertible into a `Value`.
#[macro_export]
macro_rules! params {
    () => { Vec::<$crate::sql::types::Value>::new() };
    ( $( $value:expr ),+ $(,)? ) => {
        vec![ $( $crate::sql::types::Value::from($value) ),+ ]
    };
}

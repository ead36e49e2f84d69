//! PJSON core types

use crate::date::Date;
use crate::{Error, Result};
use std::sync::Arc;

/// Token-start symbols
///
/// Every token begins with exactly one of these. Small integers and short
/// containers fold their value or length into the symbol itself.
pub mod tag {
    pub const NULL: u8 = b'n';
    pub const TRUE: u8 = b't';
    pub const FALSE: u8 = b'f';
    pub const INT: u8 = b'i';
    pub const FLOAT: u8 = b'l';
    pub const DATE: u8 = b'D';
    pub const STRING: u8 = b's';
    pub const STRING_DEF: u8 = b'd';
    pub const STRING_REF: u8 = b'r';
    pub const KEY: u8 = b'K';
    pub const KEY_DEF: u8 = b'm';
    pub const KEY_REF: u8 = b'k';
    pub const ARRAY: u8 = b'a';
    pub const OBJECT: u8 = b'o';
    pub const STRUCT_REF: u8 = b'R';
    /// Ignored between tokens
    pub const PAD: u8 = b'~';

    /// Integers `0..=SMALL_INT_MAX`
    pub const SMALL_INT: &[u8; 51] = b"MNOPQSTUVWXYZbceghjpquvwxyz!\"#$%&'()*+,-./:;<=>?@[\\";
    pub const SMALL_INT_MAX: i64 = 50;

    /// Arrays of length `0..SHORT_LEN`
    pub const SHORT_ARRAY: &[u8; 10] = b"0123456789";
    /// Objects of length `0..SHORT_LEN`
    pub const SHORT_OBJECT: &[u8; 10] = b"ABCEFGHIJL";
    pub const SHORT_LEN: usize = 10;
}

/// Runtime value representation
///
/// Arrays and objects sit behind an `Arc`: a container reachable from
/// several places is one allocation, and that identity is what structural
/// references deduplicate on. Containers are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(Date),
    Array(Arc<Vec<Value>>),
    /// Insertion-ordered entries; keys are unique
    Object(Arc<Vec<(String, Value)>>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn empty_array() -> Self {
        Value::array(Vec::new())
    }

    pub fn empty_object() -> Self {
        Value::Object(Arc::new(Vec::new()))
    }

    /// Look up an object member
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up an array element
    pub fn index(&self, i: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True if both values are the same container allocation
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert from serde_json::Value
    ///
    /// Integers outside the i64 range are rejected rather than rounded.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if n.is_u64() {
                    return Err(Error::UnsupportedValue(format!(
                        "integer {} exceeds the 64-bit signed range",
                        n
                    )));
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(Error::UnsupportedValue(format!("number {}", n)));
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => Value::array(
                arr.iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_json::Value::Object(obj) => Value::Object(Arc::new(
                obj.iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(v)?)))
                    .collect::<Result<Vec<_>>>()?,
            )),
        })
    }

    /// Convert to serde_json::Value
    ///
    /// Follows `JSON.stringify`: non-finite floats become null and dates
    /// become RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => d
                .to_rfc3339()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Value::to_json).collect())
            }
            Value::Object(obj) => {
                let map: serde_json::Map<String, serde_json::Value> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                serde_json::Value::Object(map)
            }
        }
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = Error;

    fn try_from(json: &serde_json::Value) -> Result<Self> {
        Value::from_json(json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

//! Runtime values bound to fields, primary keys and SQL literals.

use serde::{Deserialize, Serialize};

use crate::catalog::ScalarType;
use crate::sql::SqlType;

/// A runtime field value.
///
/// Maps to the scalar types declared in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a numeric zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int32(i) => *i == 0,
            Value::Int64(i) | Value::Timestamp(i) => *i == 0,
            Value::Float32(f) => *f == 0.0,
            Value::Float64(f) => *f == 0.0,
            _ => false,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) | Value::Timestamp(i) => Some(*i),
            Value::Int32(i) => Some(*i as i64),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            Value::Float32(f) => Some(*f as f64),
            _ => self.as_i64().map(|i| i as f64),
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Storage type this value has on its own, without a declared field type.
    pub fn storage_type(&self) -> SqlType {
        match self {
            Value::Null => SqlType::Null,
            Value::Bool(_) | Value::Int32(_) | Value::Int64(_) | Value::Timestamp(_) => {
                SqlType::Integer
            }
            Value::Float32(_) | Value::Float64(_) => SqlType::Real,
            Value::String(_) => SqlType::Text,
            Value::Bytes(_) => SqlType::Blob,
        }
    }

    /// Bare textual form used when embedding the value in SQL.
    pub fn sql_text(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::Int32(i) => i.to_string(),
            Value::Int64(i) | Value::Timestamp(i) => i.to_string(),
            Value::Float32(f) => f.to_string(),
            Value::Float64(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("X'{}'", hex::encode(b)),
        }
    }

    /// Deterministic 32-bit hash used for cache identity.
    ///
    /// Integer variants hash by numeric value so a key read back from storage
    /// as `Int64` matches one declared as `Int32`.
    pub fn identity_hash(&self) -> i32 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => {
                if *b {
                    1231
                } else {
                    1237
                }
            }
            Value::Int32(i) => long_hash(*i as i64),
            Value::Int64(i) | Value::Timestamp(i) => long_hash(*i),
            Value::Float32(f) => long_hash((*f as f64).to_bits() as i64),
            Value::Float64(f) => long_hash(f.to_bits() as i64),
            Value::String(s) => string_hash(s),
            Value::Bytes(bytes) => bytes
                .iter()
                .fold(1i32, |h, b| h.wrapping_mul(31).wrapping_add(*b as i8 as i32)),
        }
    }

    /// Convert a value read from storage into the declared scalar type.
    ///
    /// Storage engines with loose typing hand back `Int64` for every integer
    /// column; this narrows it again. Values that do not fit are returned as-is.
    pub fn coerce(self, scalar: &ScalarType) -> Value {
        match (scalar, self) {
            (ScalarType::Bool, Value::Int64(i)) => Value::Bool(i != 0),
            (ScalarType::Int32, Value::Int64(i)) => match i32::try_from(i) {
                Ok(narrow) => Value::Int32(narrow),
                Err(_) => Value::Int64(i),
            },
            (ScalarType::Timestamp, Value::Int64(i)) => Value::Timestamp(i),
            (ScalarType::Float32, Value::Float64(f)) => Value::Float32(f as f32),
            (ScalarType::Float64, Value::Int64(i)) => Value::Float64(i as f64),
            (_, value) => value,
        }
    }
}

/// Polynomial string hash (`s[0]*31^(n-1) + ... + s[n-1]`) with wrapping arithmetic.
pub(crate) fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

fn long_hash(v: i64) -> i32 {
    (v ^ ((v as u64) >> 32) as i64) as i32
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_hashes_agree_across_widths() {
        assert_eq!(Value::Int32(42).identity_hash(), Value::Int64(42).identity_hash());
        assert_eq!(Value::Int64(42).identity_hash(), 42);
        assert_ne!(Value::Int64(42).identity_hash(), Value::Int64(43).identity_hash());
    }

    #[test]
    fn test_string_hash_is_polynomial() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("ab"), 97 * 31 + 98);
        assert_eq!(Value::from("ab").identity_hash(), 97 * 31 + 98);
    }

    #[test]
    fn test_storage_types() {
        assert_eq!(Value::Int32(1).storage_type(), SqlType::Integer);
        assert_eq!(Value::Bool(true).storage_type(), SqlType::Integer);
        assert_eq!(Value::Float64(1.5).storage_type(), SqlType::Real);
        assert_eq!(Value::from("x").storage_type(), SqlType::Text);
        assert_eq!(Value::Bytes(vec![1]).storage_type(), SqlType::Blob);
        assert_eq!(Value::Null.storage_type(), SqlType::Null);
    }

    #[test]
    fn test_sql_text() {
        assert_eq!(Value::Int64(42).sql_text(), "42");
        assert_eq!(Value::Bool(true).sql_text(), "1");
        assert_eq!(Value::Null.sql_text(), "NULL");
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).sql_text(), "X'ab01'");
    }

    #[test]
    fn test_coerce_from_storage() {
        assert_eq!(Value::Int64(7).coerce(&ScalarType::Int32), Value::Int32(7));
        assert_eq!(Value::Int64(1).coerce(&ScalarType::Bool), Value::Bool(true));
        assert_eq!(
            Value::Int64(i64::MAX).coerce(&ScalarType::Int32),
            Value::Int64(i64::MAX)
        );
        assert_eq!(
            Value::from("x").coerce(&ScalarType::String),
            Value::String("x".into())
        );
    }

    #[test]
    fn test_zero_detection() {
        assert!(Value::Int32(0).is_zero());
        assert!(Value::Int64(0).is_zero());
        assert!(!Value::Int64(3).is_zero());
        assert!(!Value::from("0").is_zero());
    }
}

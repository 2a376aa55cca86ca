//! Field values and data types
//!
//! Ordering rules:
//! - Int and Real use their natural numeric order (Real uses IEEE total order)
//! - Text compares lexicographically by bytes
//! - Values of different types order by type rank: Int < Real < Text

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Real,
    /// UTF-8 text
    Text,
}

impl DataType {
    /// Default declared byte size for the type.
    ///
    /// Text has no natural size; the catalog declares it per attribute.
    pub fn default_size(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Real => 4,
            DataType::Text => 0,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            DataType::Int => 0,
            DataType::Real => 1,
            DataType::Text => 2,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Real => write!(f, "REAL"),
            DataType::Text => write!(f, "TEXT"),
        }
    }
}

/// A single field value
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Returns the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Real(_) => DataType::Real,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Total order over values.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (a, b) => a.data_type().rank().cmp(&b.data_type().rank()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_ordering() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Ordering::Less);
        assert_eq!(Value::Int(-5).compare(&Value::Int(-5)), Ordering::Equal);
    }

    #[test]
    fn test_real_total_order() {
        assert_eq!(Value::Real(1.5).compare(&Value::Real(0.5)), Ordering::Greater);
        // NaN is ordered rather than incomparable
        assert_eq!(
            Value::Real(f64::NAN).compare(&Value::Real(f64::NAN)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_text_ordering() {
        assert_eq!(
            Value::from("alice").compare(&Value::from("bob")),
            Ordering::Less
        );
    }

    #[test]
    fn test_cross_type_rank() {
        assert_eq!(Value::Int(100).compare(&Value::Real(0.0)), Ordering::Less);
        assert_eq!(Value::from("a").compare(&Value::Int(9)), Ordering::Greater);
    }

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::Int.to_string(), "INT");
        assert_eq!(DataType::Text.to_string(), "TEXT");
    }
}

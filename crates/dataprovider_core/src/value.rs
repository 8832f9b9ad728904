//! Define the heterogeneous values a data provider emits.
//!
//! A row handed to a test is a fixed-length sequence of [`Value`]s. The variants mirror what a data provider
//! can realistically produce: scalars, strings, absent values, sequences of a primitive element type, nested
//! sequences of values, and opaque objects that only know how to display themselves.
//!
//! ## Notes
//! - [`PrimitiveArray`] and [`Value::Array`] are deliberately distinct: the formatter renders the former with
//!   its canonical sequence rendering and recurses into the latter.
//! - `Value` is `PartialEq` but not `Eq` (floats).

use std::fmt;
use std::sync::Arc;

use crate::format;

/// One parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An absent value.
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    Float(f64),
    Str(String),
    /// A sequence whose element type is a primitive (numeric, boolean or character).
    Primitive(PrimitiveArray),
    /// A sequence of arbitrary values, possibly nested.
    Array(Vec<Value>),
    /// Anything else; rendered with its `Display` implementation.
    Opaque(OpaqueValue),
}

impl Value {
    /// Wrap an arbitrary displayable object.
    pub fn opaque<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Value::Opaque(OpaqueValue::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Return the string slice if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Return the integer if this is an `Int` value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format::format_value(self))
    }
}

/// A sequence of a primitive element type.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Bool(Vec<bool>),
    Byte(Vec<i8>),
    Char(Vec<char>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl PrimitiveArray {
    pub fn len(&self) -> usize {
        match self {
            PrimitiveArray::Bool(v) => v.len(),
            PrimitiveArray::Byte(v) => v.len(),
            PrimitiveArray::Char(v) => v.len(),
            PrimitiveArray::Short(v) => v.len(),
            PrimitiveArray::Int(v) => v.len(),
            PrimitiveArray::Long(v) => v.len(),
            PrimitiveArray::Float(v) => v.len(),
            PrimitiveArray::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An object the engine knows nothing about except how to display it.
///
/// Two opaque values are equal only when they share the same allocation.
#[derive(Clone)]
pub struct OpaqueValue(Arc<dyn fmt::Display + Send + Sync>);

impl OpaqueValue {
    pub fn new<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }
}

impl fmt::Display for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueValue({})", self.0)
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

// ============================================================================
// Conversions
// ============================================================================

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! value_from_primitive_vec {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::Primitive(PrimitiveArray::$variant(values))
                }
            }
        )*
    };
}

value_from_primitive_vec!(
    bool => Bool,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double
);

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Self {
        Value::Array(values.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Value::Array(values.into_iter().map(Value::from).collect())
    }
}

impl From<PrimitiveArray> for Value {
    fn from(values: PrimitiveArray) -> Self {
        Value::Primitive(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals_become_int() {
        assert_eq!(Value::from(7), Value::Int(7));
        assert_eq!(Value::from(7u8), Value::Int(7));
    }

    #[test]
    fn none_becomes_null() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".to_string()));
    }

    #[test]
    fn primitive_vectors_stay_primitive() {
        assert_eq!(
            Value::from(vec![1, 2, 3]),
            Value::Primitive(PrimitiveArray::Int(vec![1, 2, 3]))
        );
        assert_eq!(
            Value::from(vec!["a"]),
            Value::Array(vec![Value::Str("a".to_string())])
        );
    }

    #[test]
    fn opaque_equality_is_identity() {
        let a = OpaqueValue::new("thing");
        let b = OpaqueValue::new("thing");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}

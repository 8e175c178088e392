//! Conversion traits between [`Value`] and plain Rust types

use crate::error::{ValueError, ValueResult};
use crate::value::Value;

/// Convert from a [`Value`] reference to a Rust type.
///
/// Implement this trait to allow your type to be read out of a property or
/// an event payload.
pub trait FromValue: Sized {
    /// Convert from a value, returning an error if the kind doesn't match.
    fn from_value(value: &Value) -> ValueResult<Self>;
}

/// Convert from a Rust type to a [`Value`].
///
/// Implement this trait to allow your type to be written into a property or
/// carried as event data.
pub trait IntoValue {
    /// Convert to a value.
    fn into_value(self) -> Value;
}

// ============================================================================
// Primitive Type Implementations
// ============================================================================

impl FromValue for bool {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| ValueError::mismatch("bool", value.kind_name()))
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value
            .as_int()
            .ok_or_else(|| ValueError::mismatch("int", value.kind_name()))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value
            .as_float()
            .ok_or_else(|| ValueError::mismatch("float", value.kind_name()))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ValueError::mismatch("string", value.kind_name()))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> ValueResult<Self> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

// Unit type (for writes that carry no payload)
impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(inner) => inner.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

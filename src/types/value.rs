//! Values exchanged with the foreign runtime and the types members declare for them

use crate::errors::MarshalError;
use crate::handle::ForeignValue;
use crate::synth::Adapter;
use std::fmt;
use std::sync::Arc;

/// Declared type of a parameter, property or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Void,
    Any,
    Bool,
    I32,
    I64,
    F64,
    String,
    Bytes,
    List(Box<ValueType>),
    /// Foreign object whose `type_name()` must match
    Object(String),
    /// Another interface, satisfied by an adapter implementing it
    Interface(String),
    /// Any foreign value, unwrapping adapters back to their foreign value
    Foreign,
    Optional(Box<ValueType>),
}

impl ValueType {
    pub fn list(inner: ValueType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn optional(inner: ValueType) -> Self {
        Self::Optional(Box::new(inner))
    }

    #[inline]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    #[inline]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64)
    }

    /// Convert `value` to this type.
    ///
    /// With `coerce_numbers`, integers widen (`I32 -> I64 -> F64`) and wider
    /// numbers narrow only when the value fits exactly.
    pub fn coerce(&self, value: Value, coerce_numbers: bool) -> Result<Value, MarshalError> {
        match (self, value) {
            (Self::Void, _) => Ok(Value::Null),
            (Self::Any, v) => Ok(v),
            (Self::Optional(_), Value::Null) => Ok(Value::Null),
            (Self::Optional(inner), v) => inner.coerce(v, coerce_numbers),

            (Self::Bool, v @ Value::Bool(_)) => Ok(v),
            (Self::String, v @ Value::String(_)) => Ok(v),
            (Self::Bytes, v @ Value::Bytes(_)) => Ok(v),

            (Self::I32, v @ Value::I32(_)) => Ok(v),
            (Self::I64, v @ Value::I64(_)) => Ok(v),
            (Self::F64, v @ Value::F64(_)) => Ok(v),
            (Self::I32, Value::I64(n)) if coerce_numbers && i32::try_from(n).is_ok() => {
                Ok(Value::I32(n as i32))
            }
            (Self::I32, Value::F64(f)) if coerce_numbers && is_exact_int(f, i32::MIN as f64, i32::MAX as f64) => {
                Ok(Value::I32(f as i32))
            }
            (Self::I64, Value::I32(n)) if coerce_numbers => Ok(Value::I64(n as i64)),
            (Self::I64, Value::F64(f)) if coerce_numbers && is_exact_int(f, -9.007_199_254_740_992e15, 9.007_199_254_740_992e15) => {
                Ok(Value::I64(f as i64))
            }
            (Self::F64, Value::I32(n)) if coerce_numbers => Ok(Value::F64(n as f64)),
            (Self::F64, Value::I64(n)) if coerce_numbers && n.unsigned_abs() <= (1u64 << 53) => {
                Ok(Value::F64(n as f64))
            }

            (Self::List(inner), Value::List(items)) => items
                .into_iter()
                .map(|item| inner.coerce(item, coerce_numbers))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),

            (Self::Object(name), Value::Foreign(obj)) if obj.type_name() == name => {
                Ok(Value::Foreign(obj))
            }
            (Self::Interface(name), Value::Adapter(adapter)) if adapter.implements(name) => {
                Ok(Value::Adapter(adapter))
            }
            (Self::Foreign, v @ Value::Foreign(_)) => Ok(v),
            (Self::Foreign, Value::Adapter(adapter)) => {
                adapter.foreign_value().map(Value::Foreign).map_err(|e| MarshalError::Foreign(e.to_string()))
            }

            (expected, got) => Err(MarshalError::TypeMismatch {
                expected: expected.to_string(),
                got: got.type_name(),
            }),
        }
    }
}

fn is_exact_int(f: f64, min: f64, max: f64) -> bool {
    f.fract() == 0.0 && f >= min && f <= max
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Any => write!(f, "any"),
            Self::Bool => write!(f, "bool"),
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::F64 => write!(f, "f64"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::List(inner) => write!(f, "list<{}>", inner),
            Self::Object(name) => write!(f, "object {}", name),
            Self::Interface(name) => write!(f, "interface {}", name),
            Self::Foreign => write!(f, "foreign"),
            Self::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}

/// A value on the native side of the boundary
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Foreign(ForeignValue),
    Adapter(Arc<Adapter>),
}

impl Value {
    /// Short type name used in diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(_) => "bool".to_string(),
            Self::I32(_) => "i32".to_string(),
            Self::I64(_) => "i64".to_string(),
            Self::F64(_) => "f64".to_string(),
            Self::String(_) => "string".to_string(),
            Self::Bytes(_) => "bytes".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Foreign(obj) => format!("foreign {}", obj.type_name()),
            Self::Adapter(adapter) => format!("adapter {}", adapter.synthesized_type().name()),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            // Identity, not structural equality
            (Self::Foreign(a), Self::Foreign(b)) => Arc::ptr_eq(a, b),
            (Self::Adapter(a), Self::Adapter(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => write!(f, "Bool({})", b),
            Self::I32(n) => write!(f, "I32({})", n),
            Self::I64(n) => write!(f, "I64({})", n),
            Self::F64(n) => write!(f, "F64({})", n),
            Self::String(s) => write!(f, "String({:?})", s),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Foreign(obj) => write!(f, "Foreign({:?})", obj),
            Self::Adapter(adapter) => write!(f, "Adapter({})", adapter.synthesized_type().name()),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::F64(n)
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

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<ForeignValue> for Value {
    fn from(obj: ForeignValue) -> Self {
        Value::Foreign(obj)
    }
}

impl From<Arc<Adapter>> for Value {
    fn from(adapter: Arc<Adapter>) -> Self {
        Value::Adapter(adapter)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

macro_rules! try_from_value {
    ($target:ty, $variant:ident, $expected:literal) => {
        impl TryFrom<Value> for $target {
            type Error = MarshalError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(MarshalError::TypeMismatch {
                        expected: $expected.to_string(),
                        got: other.type_name(),
                    }),
                }
            }
        }
    };
}

try_from_value!(bool, Bool, "bool");
try_from_value!(i32, I32, "i32");
try_from_value!(i64, I64, "i64");
try_from_value!(f64, F64, "f64");
try_from_value!(String, String, "string");
try_from_value!(Vec<u8>, Bytes, "bytes");
try_from_value!(ForeignValue, Foreign, "foreign");
try_from_value!(Arc<Adapter>, Adapter, "adapter");

impl TryFrom<Value> for () {
    type Error = MarshalError;

    fn try_from(_: Value) -> Result<Self, Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_discards_result() {
        assert_eq!(ValueType::Void.coerce(Value::I32(7), true), Ok(Value::Null));
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(ValueType::I64.coerce(Value::I32(7), true), Ok(Value::I64(7)));
        assert_eq!(ValueType::F64.coerce(Value::I32(2), true), Ok(Value::F64(2.0)));
    }

    #[test]
    fn test_numeric_narrowing_requires_exact_fit() {
        assert_eq!(ValueType::I32.coerce(Value::F64(3.0), true), Ok(Value::I32(3)));
        assert!(ValueType::I32.coerce(Value::F64(3.5), true).is_err());
        assert!(ValueType::I32.coerce(Value::I64(i64::MAX), true).is_err());
    }

    #[test]
    fn test_strict_numbers_reject_widening() {
        let err = ValueType::I64.coerce(Value::I32(7), false).unwrap_err();
        assert_eq!(
            err,
            MarshalError::TypeMismatch {
                expected: "i64".to_string(),
                got: "i32".to_string(),
            }
        );
    }

    #[test]
    fn test_optional_accepts_null() {
        let ty = ValueType::optional(ValueType::String);
        assert_eq!(ty.coerce(Value::Null, true), Ok(Value::Null));
        assert_eq!(ty.coerce("x".into(), true), Ok(Value::String("x".into())));
        assert!(ValueType::String.coerce(Value::Null, true).is_err());
    }

    #[test]
    fn test_list_coerces_elements() {
        let ty = ValueType::list(ValueType::F64);
        let coerced = ty.coerce(Value::List(vec![Value::I32(1), Value::F64(2.5)]), true);
        assert_eq!(coerced, Ok(Value::List(vec![Value::F64(1.0), Value::F64(2.5)])));
    }

    #[test]
    fn test_try_from_value() {
        assert_eq!(i64::try_from(Value::I64(9)), Ok(9));
        assert!(String::try_from(Value::Bool(true)).is_err());
        assert_eq!(<()>::try_from(Value::I32(1)), Ok(()));
    }

    #[test]
    fn test_display_nested_types() {
        let ty = ValueType::optional(ValueType::list(ValueType::Interface("app.INode".into())));
        assert_eq!(ty.to_string(), "list<interface app.INode>?");
    }
}

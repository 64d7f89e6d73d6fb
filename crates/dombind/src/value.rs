//! Host and typed value representations
//!
//! `HostValue` is what crosses the boundary: the loosely-typed shape the
//! host hands back from a property read or an operation call. `Value` is
//! the typed side, produced and consumed by the coercion engine.

use std::fmt;

use crate::binder::Wrapper;
use crate::error::{BindResult, BindingError};
use crate::types::DeclaredType;

// ============================================================================
// Host side
// ============================================================================

/// Opaque reference to exactly one host object.
///
/// The numeric id is assigned by the host; the core never interprets it
/// beyond identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostRef(u64);

impl HostRef {
    /// Create from a host-assigned id
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Host-assigned id
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostRef({:#x})", self.0)
    }
}

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Host representation of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Absent value
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// All host numbers are doubles
    Number(f64),
    /// Host string
    String(String),
    /// Host collection, referenced not copied
    Array(HostRef),
    /// Any other host object
    Object(HostRef),
}

impl HostValue {
    /// Check for `Null` or `Undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, HostValue::Null | HostValue::Undefined)
    }

    /// Referenced host object, for arrays and objects
    pub fn as_ref(&self) -> Option<HostRef> {
        match self {
            HostValue::Array(r) | HostValue::Object(r) => Some(*r),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(n as f64)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

// ============================================================================
// Typed side
// ============================================================================

/// A host collection seen through a declared element type.
///
/// Holding a `Sequence` does not copy any elements; element reads go back
/// to the host through the binder.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    host: HostRef,
    element: Option<DeclaredType>,
}

impl Sequence {
    /// Wrap a host array reference
    pub fn new(host: HostRef, element: Option<DeclaredType>) -> Self {
        Self { host, element }
    }

    /// The underlying host array
    pub fn host_ref(&self) -> HostRef {
        self.host
    }

    /// Declared element type, if any
    pub fn element_type(&self) -> Option<&DeclaredType> {
        self.element.as_ref()
    }
}

/// Typed representation of a value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Result of a void call
    Void,
    /// Null for a nullable declared type
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// Double
    Number(f64),
    /// Text
    Text(String),
    /// Host collection
    Sequence(Sequence),
    /// Bound wrapper
    Object(Wrapper),
}

impl Value {
    /// Check if this is the void marker
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::Sequence(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Wrapper::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ============================================================================
// Value Conversion Traits
// ============================================================================

/// Convert from a typed `Value` to a Rust type.
pub trait FromValue: Sized {
    /// Convert, failing with `CoercionError` on a kind mismatch
    fn from_value(value: Value) -> BindResult<Self>;
}

/// Convert from a Rust type to a typed `Value`.
pub trait IntoValue {
    /// Convert to a `Value`
    fn into_value(self) -> Value;
}

fn mismatch(expected: &str, got: &Value) -> BindingError {
    BindingError::coercion(expected, got.kind_name())
}

impl FromValue for Value {
    fn from_value(value: Value) -> BindResult<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Void | Value::Null => Ok(()),
            other => Err(mismatch("void", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Number(n) => Ok(n),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch("number", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Sequence {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Sequence(s) => Ok(s),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl FromValue for Wrapper {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Object(w) => Ok(w),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> BindResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Void
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for Sequence {
    fn into_value(self) -> Value {
        Value::Sequence(self)
    }
}

impl IntoValue for Wrapper {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl IntoValue for &Wrapper {
    fn into_value(self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    v.into_value()
                }
            }
        )*
    };
}

value_from!(bool, i32, f64, String, &str, Sequence, Wrapper);

//! Runtime value types
//!
//! Two value models meet in this crate. [`Value`] is the engine's closed
//! tagged union holding the wire vocabulary shared with the evaluator: `Str`,
//! `Int`, `Bool`, `None`, `List`, `Bytes`, `Scope`, `PyObject`, any tag
//! containing `Error`, plus a Str-rule fallback for everything else.
//! [`HostValue`] is the host-side model: open-ended through `From` impls and
//! the [`HostObject`] escape hatch for values with no structural
//! representation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::scope::{Scope, ScopeMap};

/// Wire tag vocabulary shared with the engine.
///
/// Error-family tags are not listed here: any tag whose name contains
/// `Error` maps to [`Value::Error`], with the tag name preserved in
/// [`ErrorInfo::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    Str,
    Int,
    Bool,
    None,
    List,
    Bytes,
    Scope,
    PyObject,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Str => "Str",
            Tag::Int => "Int",
            Tag::Bool => "Bool",
            Tag::None => "None",
            Tag::List => "List",
            Tag::Bytes => "Bytes",
            Tag::Scope => "Scope",
            Tag::PyObject => "PyObject",
        }
    }
}

/// Error payload carried by an Error-tagged value.
///
/// `kind` keeps the original tag name (`Error`, `TypeError`, `SyntaxError`,
/// ...) so engines with several error tags lose nothing in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Engine value representation.
///
/// Exactly one payload per tag. `Int` carries a floating payload for both
/// integers and general floats; the engine's numeric model does not
/// distinguish them; the codec re-splits on decode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(f64),
    Bool(bool),
    None,
    List(Vec<Value>),
    Bytes(Vec<u8>),
    Scope(Scope),
    /// Opaque host handle, passed through verbatim. Wire tag `PyObject`.
    Opaque(HostObject),
    /// Any wire tag whose name contains `Error`.
    Error(ErrorInfo),
    /// Unknown wire tag; decodes via the Str rule.
    Other { tag: String, text: String },
}

impl Value {
    /// Build a value from a raw wire tag and its string payload.
    ///
    /// Tags containing `Error` become [`Value::Error`]; anything outside the
    /// fixed vocabulary lands in [`Value::Other`]. This is the constructor
    /// engines use for tags the closed variants cannot express (`Undefined`,
    /// `ModuleNotfound`, ...).
    pub fn with_tag(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let tag = tag.into();
        let text = text.into();

        if tag.contains("Error") {
            return Value::Error(ErrorInfo::new(tag, text));
        }

        match tag.as_str() {
            "Str" => Value::Str(text),
            "None" => Value::None,
            _ => Value::Other { tag, text },
        }
    }

    /// Build an Error value with the conventional `"Error: "` prefix.
    pub fn make_error(message: impl AsRef<str>) -> Self {
        Value::Error(ErrorInfo::new(
            "Error",
            format!("Error: {}", message.as_ref()),
        ))
    }

    /// The wire tag name of this value.
    pub fn tag_name(&self) -> &str {
        match self {
            Value::Str(_) => "Str",
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::None => "None",
            Value::List(_) => "List",
            Value::Bytes(_) => "Bytes",
            Value::Scope(_) => "Scope",
            Value::Opaque(_) => "PyObject",
            Value::Error(info) => &info.kind,
            Value::Other { tag, .. } => tag,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

/// Host value representation.
///
/// The ingress side of the codec. `Int` and `Float` are distinct here but
/// share the engine's `Int` tag; integral floats normalize back to `Int` on
/// decode.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<HostValue>),
    Bytes(Vec<u8>),
    Scope(ScopeMap),
    Opaque(HostObject),
}

impl HostValue {
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        HostValue::Bytes(bytes.into())
    }

    /// Wrap an arbitrary host value as an opaque handle. The codec never
    /// inspects it; it round-trips by reference identity.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        HostValue::Opaque(HostObject::new(value))
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Str(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(value as i64)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<()> for HostValue {
    fn from(_: ()) -> Self {
        HostValue::None
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        HostValue::List(value)
    }
}

impl From<ScopeMap> for HostValue {
    fn from(value: ScopeMap) -> Self {
        HostValue::Scope(value)
    }
}

impl<T> From<Option<T>> for HostValue
where
    HostValue: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => HostValue::from(inner),
            None => HostValue::None,
        }
    }
}

/// Opaque host handle.
///
/// A cheaply clonable reference to a value the codec cannot (and must not)
/// decompose. Equality is reference identity, matching the round-trip
/// guarantee for unclassified values.
#[derive(Clone)]
pub struct HostObject(Arc<dyn Any + Send + Sync>);

impl HostObject {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the underlying value, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({:p})", Arc::as_ptr(&self.0))
    }
}

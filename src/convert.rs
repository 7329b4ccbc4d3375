//! Value codec
//!
//! Bidirectional conversion between [`HostValue`] and the engine's [`Value`]
//! model, plus a serde_json bridge for hosts that carry payloads as JSON.
//!
//! Encoding is total: every host value has exactly one tag, with `Opaque`
//! as the pass-through for shapes the engine model cannot express. Decoding
//! returns [`EvalResult`]: Error-tagged values come back as the `Err` arm
//! rather than a value the caller has to sniff.

use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;

use crate::errors::{EvalResult, ScriptException};
use crate::scope::Scope;
use crate::value::{HostValue, Tag, Value};

/// The tag a host value encodes to.
///
/// Both `Int` and `Float` map to `Tag::Int`; the engine's numeric model is
/// a single floating payload and the split is only recovered on decode.
pub fn classify(value: &HostValue) -> Tag {
    match value {
        HostValue::Str(_) => Tag::Str,
        HostValue::Int(_) | HostValue::Float(_) => Tag::Int,
        HostValue::Bool(_) => Tag::Bool,
        HostValue::None => Tag::None,
        HostValue::List(_) => Tag::List,
        HostValue::Bytes(_) => Tag::Bytes,
        HostValue::Scope(_) => Tag::Scope,
        HostValue::Opaque(_) => Tag::PyObject,
    }
}

/// Encode a host value into the engine representation.
pub fn to_value(value: HostValue) -> Value {
    match value {
        HostValue::Str(s) => Value::Str(s),
        HostValue::Int(n) => Value::Int(n as f64),
        HostValue::Float(x) => Value::Int(x),
        HostValue::Bool(b) => Value::Bool(b),
        HostValue::None => Value::None,
        HostValue::List(items) => Value::List(items.into_iter().map(to_value).collect()),
        HostValue::Bytes(bytes) => Value::Bytes(bytes),
        HostValue::Scope(map) => {
            let mut scope = Scope::new();
            for (name, value) in map {
                scope.set(name, to_value(value));
            }
            Value::Scope(scope)
        }
        HostValue::Opaque(object) => Value::Opaque(object),
    }
}

/// Decode an engine value back into a host value.
///
/// Inverse of [`to_value`] per tag, with two deliberate asymmetries: an
/// `Int` payload without a fractional part normalizes to `HostValue::Int`,
/// and Error-tagged values decode to `Err(ScriptException)` carrying the
/// payload message. Unknown tags decode via the Str rule. Containers
/// propagate the first nested exception.
pub fn to_host(value: &Value) -> EvalResult {
    match value {
        Value::Str(s) => Ok(HostValue::Str(s.clone())),
        Value::Int(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                Ok(HostValue::Int(*n as i64))
            } else {
                Ok(HostValue::Float(*n))
            }
        }
        Value::Bool(b) => Ok(HostValue::Bool(*b)),
        Value::None => Ok(HostValue::None),
        Value::List(items) => Ok(HostValue::List(
            items.iter().map(to_host).collect::<Result<_, _>>()?,
        )),
        Value::Bytes(bytes) => Ok(HostValue::Bytes(bytes.clone())),
        Value::Scope(scope) => Ok(HostValue::Scope(scope.to_host_map()?)),
        Value::Opaque(object) => Ok(HostValue::Opaque(object.clone())),
        Value::Error(info) => Err(ScriptException::new(info.message.clone())),
        Value::Other { text, .. } => Ok(HostValue::Str(text.clone())),
    }
}

/* ===================== JSON bridge ===================== */

/// Convert a JSON payload into a host value.
///
/// Whole numbers become `Int`, objects become `Scope` maps. This is how
/// JSON-carried inputs enter a script without hand-building values.
pub fn json_to_host(json: &JsonValue) -> HostValue {
    match json {
        JsonValue::Null => HostValue::None,
        JsonValue::Bool(b) => HostValue::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                HostValue::Int(i)
            } else {
                HostValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => HostValue::Str(s.clone()),
        JsonValue::Array(items) => HostValue::List(items.iter().map(json_to_host).collect()),
        JsonValue::Object(map) => HostValue::Scope(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_host(v)))
                .collect(),
        ),
    }
}

/// Convert a host value into JSON.
///
/// Bytes serialize as a number array. Opaque handles have no structural
/// representation and refuse to cross.
pub fn host_to_json(value: &HostValue) -> Result<JsonValue> {
    Ok(match value {
        HostValue::Str(s) => JsonValue::String(s.clone()),
        HostValue::Int(n) => JsonValue::Number((*n).into()),
        HostValue::Float(x) => serde_json::Number::from_f64(*x)
            .map(JsonValue::Number)
            .context("non-finite float cannot be represented in JSON")?,
        HostValue::Bool(b) => JsonValue::Bool(*b),
        HostValue::None => JsonValue::Null,
        HostValue::List(items) => JsonValue::Array(
            items
                .iter()
                .map(host_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        HostValue::Bytes(bytes) => {
            JsonValue::Array(bytes.iter().map(|b| JsonValue::Number((*b).into())).collect())
        }
        HostValue::Scope(map) => {
            let mut object = serde_json::Map::new();
            for (name, value) in map.iter() {
                object.insert(name.to_string(), host_to_json(value)?);
            }
            JsonValue::Object(object)
        }
        HostValue::Opaque(_) => bail!("opaque host values have no JSON representation"),
    })
}

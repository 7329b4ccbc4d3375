//! Error taxonomy for the embedding layer
//!
//! Three kinds of failure cross this layer, and they are kept apart by type:
//!
//! 1. Engine parse/tokenize failures: `anyhow::Error` from the [`Engine`]
//!    trait, propagated unchanged and fatal to the call that triggered them.
//! 2. The domain exception (`ScriptException`), the one error kind a host
//!    callable can raise that the script is allowed to observe as an
//!    ordinary Error value.
//! 3. Everything else inside a host callable (`CallError::Fatal`), never
//!    contained, aborts the enclosing `execute()`.
//!
//! [`Engine`]: crate::engine::Engine

use thiserror::Error;

use crate::value::HostValue;

/// Outcome of decoding an engine value into a host value.
///
/// Error-tagged values are never raised by the engine; they travel as data
/// and only become an `Err` when decoded at the host boundary. The caller
/// must inspect which arm it got; the script completed normally in both.
pub type EvalResult = std::result::Result<HostValue, ScriptException>;

/// The recognized domain exception.
///
/// A host callable returns this (via [`CallError::Script`]) to signal a
/// script-visible failure; the adapter converts it into an Error value
/// instead of aborting execution. It is also what an Error-tagged value
/// decodes to on the host side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScriptException {
    pub message: String,
}

impl ScriptException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure of a host callable invocation.
#[derive(Debug, Error)]
pub enum CallError {
    /// Contained at the adapter boundary: the script sees an Error value.
    #[error(transparent)]
    Script(#[from] ScriptException),

    /// Not contained: propagates through the evaluator and aborts the
    /// current `execute()`.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl CallError {
    /// Shorthand for raising the domain exception from a callable.
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script(ScriptException::new(message))
    }
}

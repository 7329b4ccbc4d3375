//! Host embedding layer for the Lilt scripting language
//!
//! Converts values between host Rust types and the engine's tagged value
//! model, adapts host callables (immediate and suspending) into the single
//! calling convention the evaluator invokes, and manages the lifecycle of
//! one running script. The lexer, parser, and evaluator are external
//! collaborators behind the [`Engine`] trait.

pub mod convert;
pub mod engine;
pub mod errors;
pub mod functions;
pub mod scope;
pub mod script;
pub mod value;

// Re-export the host-facing surface
pub use engine::{Engine, Evaluation, Module, ModuleTable};
pub use errors::{CallError, EvalResult, ScriptException};
pub use functions::{
    Adapter, BoxFuture, CallArgs, DuplicatePolicy, FnArgs, FnCall, FnOptions, FunctionTable,
    HostCallable,
};
pub use scope::{Scope, ScopeMap, Variable};
pub use script::{eval_literal, Script, ScriptBuilder};
pub use value::{ErrorInfo, HostObject, HostValue, Tag, Value};

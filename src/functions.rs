//! Host function adaptation
//!
//! A host callable, immediate or suspending, is wrapped at registration
//! time into an [`Adapter`] with the single calling convention the evaluator
//! invokes: `(call name, arguments, calling scope) -> boxed future of
//! value`. The evaluator awaits the result in both modes and never branches
//! on how the callable executes.
//!
//! The adapter owns the boundary work: argument-shape dispatch (positional
//! list vs a single scope of named arguments), codec crossings in both
//! directions, and containment of the domain exception. Any other failure
//! from the callable propagates out and aborts the enclosing execution.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::convert;
use crate::errors::{CallError, ScriptException};
use crate::scope::{Scope, ScopeMap};
use crate::value::{ErrorInfo, HostValue, Value};

/// Boxed future, the uniform shape suspending work takes at this boundary.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Argument shape produced by the evaluator's calling convention.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    /// Ordered argument values.
    Positional(Vec<Value>),
    /// A single scope value: its entries are the named arguments.
    Named(Scope),
}

/// Decoded arguments as the host callable sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum FnArgs {
    Positional(Vec<HostValue>),
    Named(ScopeMap),
}

/// One invocation of a host callable.
///
/// `name` is the name the script called. Populated only for functions
/// registered with [`FnOptions::pass_call_name`], so a callable registered
/// under several names can tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct FnCall {
    pub name: Option<String>,
    pub args: FnArgs,
}

type ImmediateFn = dyn Fn(FnCall) -> std::result::Result<HostValue, CallError> + Send + Sync;
type SuspendingFn =
    dyn Fn(FnCall) -> BoxFuture<'static, std::result::Result<HostValue, CallError>> + Send + Sync;

/// A host callable with its execution mode fixed at construction.
#[derive(Clone)]
pub enum HostCallable {
    Immediate(Arc<ImmediateFn>),
    Suspending(Arc<SuspendingFn>),
}

impl HostCallable {
    /// Wrap a synchronous callable.
    pub fn immediate<F>(f: F) -> Self
    where
        F: Fn(FnCall) -> std::result::Result<HostValue, CallError> + Send + Sync + 'static,
    {
        Self::Immediate(Arc::new(f))
    }

    /// Wrap an asynchronous callable. The adapter yields to the host
    /// scheduler until the future completes, then converts its result.
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(FnCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<HostValue, CallError>> + Send + 'static,
    {
        Self::Suspending(Arc::new(move |call| Box::pin(f(call))))
    }
}

/// The uniform adapter signature the evaluator invokes.
pub type Adapter = Arc<dyn Fn(&str, CallArgs, &Scope) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Registration options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FnOptions {
    /// Hand the callable the name it was invoked under.
    pub pass_call_name: bool,
}

impl FnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass_call_name(mut self, pass: bool) -> Self {
        self.pass_call_name = pass;
        self
    }
}

/// Resolution policy when the same name is registered more than once.
///
/// The table itself is append-only and keeps every registration; the policy
/// only governs which entry `resolve` hands to the evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Re-registering a name shadows the earlier registration.
    #[default]
    LastWins,
    /// The earliest registration under a name stays authoritative.
    FirstWins,
}

/// A registered function: the script-visible name and its adapter.
#[derive(Clone)]
pub struct FnEntry {
    pub name: String,
    pub adapter: Adapter,
}

/// Append-only function table handed to the evaluator.
#[derive(Clone, Default)]
pub struct FunctionTable {
    entries: Vec<FnEntry>,
    policy: DuplicatePolicy,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register a callable under `name` with default options.
    pub fn register(&mut self, name: impl Into<String>, callable: HostCallable) {
        self.register_with(name, callable, FnOptions::default());
    }

    /// Register a callable under `name`, appending to the table. Duplicate
    /// names may coexist; see [`DuplicatePolicy`].
    pub fn register_with(
        &mut self,
        name: impl Into<String>,
        callable: HostCallable,
        options: FnOptions,
    ) {
        let name = name.into();
        trace!(function = %name, "registering host function");
        self.entries.push(FnEntry {
            name,
            adapter: build_adapter(callable, options),
        });
    }

    /// Look up the adapter for `name` under the table's duplicate policy.
    pub fn resolve(&self, name: &str) -> Option<&Adapter> {
        let mut matches = self.entries.iter().filter(|e| e.name == name);
        match self.policy {
            DuplicatePolicy::FirstWins => matches.next().map(|e| &e.adapter),
            DuplicatePolicy::LastWins => matches.last().map(|e| &e.adapter),
        }
    }

    /// Resolve and invoke in one step; `None` if no function matches.
    pub fn invoke(
        &self,
        name: &str,
        args: CallArgs,
        scope: &Scope,
    ) -> Option<BoxFuture<'static, Result<Value>>> {
        self.resolve(name).map(|adapter| adapter(name, args, scope))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTable")
            .field("names", &self.names().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Wrap a callable into the uniform adapter.
///
/// Decoding happens before any suspension, so adapter futures own their
/// inputs and never borrow from the evaluator.
fn build_adapter(callable: HostCallable, options: FnOptions) -> Adapter {
    Arc::new(
        move |call_name: &str, args: CallArgs, _scope: &Scope| -> BoxFuture<'static, Result<Value>> {
            trace!(function = %call_name, "invoking host function");

            let decoded = match decode_args(args) {
                Ok(args) => args,
                // An Error-tagged argument short-circuits the call.
                Err(error_value) => return Box::pin(std::future::ready(Ok(error_value))),
            };

            let call = FnCall {
                name: options.pass_call_name.then(|| call_name.to_string()),
                args: decoded,
            };

            match &callable {
                HostCallable::Immediate(f) => {
                    let result = contain(f(call));
                    Box::pin(std::future::ready(result))
                }
                HostCallable::Suspending(f) => {
                    let fut = f(call);
                    Box::pin(async move { contain(fut.await) })
                }
            }
        },
    )
}

/// Argument-shape dispatch plus codec crossing.
///
/// A single scope value means named arguments; a positional list decodes
/// element-wise in order. An Error-tagged argument is returned unchanged as
/// the call's result; an exception nested deeper is rewrapped.
fn decode_args(args: CallArgs) -> std::result::Result<FnArgs, Value> {
    match args {
        CallArgs::Named(scope) => match scope.to_host_map() {
            Ok(map) => Ok(FnArgs::Named(map)),
            Err(exc) => Err(Value::Error(ErrorInfo::new("Error", exc.message))),
        },
        CallArgs::Positional(values) => {
            let mut decoded = Vec::with_capacity(values.len());
            for value in &values {
                match convert::to_host(value) {
                    Ok(host) => decoded.push(host),
                    Err(exc) => {
                        return Err(if value.is_error() {
                            value.clone()
                        } else {
                            Value::Error(ErrorInfo::new("Error", exc.message))
                        });
                    }
                }
            }
            Ok(FnArgs::Positional(decoded))
        }
    }
}

/// Convert a callable's outcome into the adapter's return.
///
/// The domain exception becomes an ordinary Error value; anything else is
/// fatal to the enclosing execution.
fn contain(result: std::result::Result<HostValue, CallError>) -> Result<Value> {
    match result {
        Ok(value) => Ok(convert::to_value(value)),
        Err(CallError::Script(ScriptException { message })) => Ok(Value::make_error(message)),
        Err(CallError::Fatal(error)) => Err(error),
    }
}

//! External engine contract
//!
//! The tokenizer, parser, and evaluator live outside this crate; a script
//! instance consumes them through exactly the four operations below. The
//! program representation is an opaque associated type, stored and passed
//! through, never inspected here.

use std::collections::HashMap;

use anyhow::Result;

use crate::functions::{BoxFuture, FunctionTable};
use crate::scope::Scope;
use crate::value::Value;

/// Result of one evaluation: the program's value and the final top-level
/// scope, which wholesale-replaces the instance's bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: Value,
    pub scope: Scope,
}

/// The external scripting engine.
///
/// `evaluate` is suspending: the returned future may yield to the host
/// scheduler while registered adapters run. The evaluator invokes at most
/// one adapter at a time on behalf of a single evaluation, and calls back
/// through [`FunctionTable::resolve`]/[`FunctionTable::invoke`] so duplicate
/// resolution stays in this layer.
pub trait Engine: Send + Sync {
    type Tokens;
    type Program: Send + Sync;

    /// Lex source text. Malformed input fails here and is not intercepted
    /// by the embedding layer.
    fn tokenize(&self, source: &str) -> Result<Self::Tokens>;

    /// Build the opaque program representation from a token stream.
    fn parse(&self, tokens: Self::Tokens) -> Result<Self::Program>;

    /// Run a program against the given bindings, functions, and modules.
    /// `debug` only affects the engine's own diagnostics.
    fn evaluate<'a>(
        &'a self,
        program: &'a Self::Program,
        bindings: Scope,
        functions: &'a FunctionTable,
        modules: &'a ModuleTable<Self::Program>,
        debug: bool,
    ) -> BoxFuture<'a, Result<Evaluation>>;

    /// Standalone expression shorthand, independent of any script instance.
    fn eval_literal(&self, text: &str) -> Result<Value>;
}

/// A registered module: retained source plus its parsed program.
///
/// Source is kept so a later `parse` of the main script can re-parse every
/// module against the same engine state.
#[derive(Debug, Clone)]
pub struct Module<P> {
    pub source: String,
    pub program: P,
}

/// Named modules available to the evaluator. Registering a name overwrites
/// any previous program under it.
#[derive(Debug, Clone)]
pub struct ModuleTable<P> {
    modules: HashMap<String, Module<P>>,
}

impl<P> ModuleTable<P> {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, module: Module<P>) {
        self.modules.insert(name.into(), module);
    }

    pub fn get(&self, name: &str) -> Option<&Module<P>> {
        self.modules.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Module<P>)> {
        self.modules.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Module<P>)> {
        self.modules.iter_mut().map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<P> Default for ModuleTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

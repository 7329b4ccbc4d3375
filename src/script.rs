//! Script lifecycle
//!
//! A [`Script`] owns one running script: its parsed program, top-level
//! bindings, function table, and named modules. It orchestrates parse and
//! execute against the external [`Engine`] and reconciles results back into
//! binding state. Execution replaces the binding store wholesale with the
//! evaluator's final scope: a binding absent from that scope no longer
//! exists, even if it did before.

use anyhow::{Context, Result};
use tracing::debug;

use crate::convert;
use crate::engine::{Engine, Module, ModuleTable};
use crate::errors::{EvalResult, ScriptException};
use crate::functions::{DuplicatePolicy, FnOptions, FunctionTable, HostCallable};
use crate::scope::{Scope, ScopeMap, Variable};
use crate::value::HostValue;

/// One embedded script and its state.
pub struct Script<E: Engine> {
    engine: E,
    program: Option<E::Program>,
    bindings: Scope,
    functions: FunctionTable,
    modules: ModuleTable<E::Program>,
}

impl<E: Engine> Script<E> {
    /// An empty script instance. Use [`Script::builder`] to construct with
    /// initial source, variables, functions, or modules.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            program: None,
            bindings: Scope::new(),
            functions: FunctionTable::new(),
            modules: ModuleTable::new(),
        }
    }

    pub fn builder(engine: E) -> ScriptBuilder<E> {
        ScriptBuilder::new(engine)
    }

    /// Tokenize and parse `source`, replacing the current program, and
    /// re-parse every registered module from its stored source.
    ///
    /// Malformed source is the engine's error, propagated unchanged.
    pub fn parse(&mut self, source: &str) -> Result<()> {
        let tokens = self.engine.tokenize(source)?;
        self.program = Some(self.engine.parse(tokens)?);

        let engine = &self.engine;
        for (_, module) in self.modules.iter_mut() {
            let tokens = engine.tokenize(&module.source)?;
            module.program = engine.parse(tokens)?;
        }

        debug!(modules = self.modules.len(), "parsed program");
        Ok(())
    }

    /// Bind `name` at top level, replacing in place or appending.
    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<HostValue>) {
        self.bindings.set(name, convert::to_value(value.into()));
    }

    /// Bind a prebuilt engine-side variable at top level.
    pub fn add_engine_variable(&mut self, variable: Variable) {
        self.bindings.set(variable.name, variable.value);
    }

    /// Parse `source` immediately and register it as module `name`,
    /// overwriting any previous program under that name.
    pub fn add_module(&mut self, name: impl Into<String>, source: &str) -> Result<()> {
        let name = name.into();
        let tokens = self.engine.tokenize(source)?;
        let program = self.engine.parse(tokens)?;

        debug!(module = %name, "registered module");
        self.modules.insert(
            name,
            Module {
                source: source.to_string(),
                program,
            },
        );
        Ok(())
    }

    /// Register an immediate or suspending callable under `name`.
    pub fn register(&mut self, name: impl Into<String>, callable: HostCallable) {
        self.functions.register(name, callable);
    }

    pub fn register_with(
        &mut self,
        name: impl Into<String>,
        callable: HostCallable,
        options: FnOptions,
    ) {
        self.functions.register_with(name, callable, options);
    }

    /// Independent host-side snapshot of the top-level bindings.
    ///
    /// Fails on the first Error-tagged binding; use [`Script::bindings`]
    /// for entry-by-entry inspection.
    pub fn variables(&self) -> std::result::Result<ScopeMap, ScriptException> {
        self.bindings.to_host_map()
    }

    /// Engine-side view of the top-level bindings.
    pub fn bindings(&self) -> &Scope {
        &self.bindings
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the current program.
    ///
    /// Suspends while the evaluator (and any suspending adapters it calls)
    /// runs. On completion the binding store is wholesale-replaced by the
    /// evaluator's final scope and the result decodes through the codec:
    /// the outer `Err` is a fatal abort (bindings untouched), the inner
    /// `Err` is an Error-tagged result carried as data (bindings replaced).
    /// `debug` only affects the engine's own diagnostics.
    pub async fn execute(&mut self, debug: bool) -> Result<EvalResult> {
        let program = self
            .program
            .as_ref()
            .context("no program has been parsed")?;

        let debug_enabled = debug;
        debug!(
            functions = self.functions.len(),
            modules = self.modules.len(),
            debug = debug_enabled,
            "executing program"
        );

        let evaluation = self
            .engine
            .evaluate(
                program,
                self.bindings.clone(),
                &self.functions,
                &self.modules,
                debug,
            )
            .await?;

        self.bindings = evaluation.scope;
        debug!(bindings = self.bindings.len(), "execution finished");

        Ok(convert::to_host(&evaluation.result))
    }
}

impl<E: Engine> std::fmt::Debug for Script<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script")
            .field("parsed", &self.program.is_some())
            .field("bindings", &self.bindings.len())
            .field("functions", &self.functions.len())
            .field("modules", &self.modules.len())
            .finish()
    }
}

/// Evaluate a standalone expression, independent of any script instance.
pub fn eval_literal<E: Engine>(engine: &E, text: &str) -> Result<EvalResult> {
    let value = engine.eval_literal(text)?;
    Ok(convert::to_host(&value))
}

/// Builder for a [`Script`] with initial state.
///
/// `build` parses eagerly, so malformed initial source or module source
/// fails construction synchronously.
pub struct ScriptBuilder<E: Engine> {
    engine: E,
    source: Option<String>,
    variables: Vec<Variable>,
    functions: Vec<(String, HostCallable, FnOptions)>,
    modules: Vec<(String, String)>,
    policy: DuplicatePolicy,
}

impl<E: Engine> ScriptBuilder<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            source: None,
            variables: Vec::new(),
            functions: Vec::new(),
            modules: Vec::new(),
            policy: DuplicatePolicy::default(),
        }
    }

    /// Initial script source, parsed during `build`.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Bind an initial top-level variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.variables.push(Variable::new(name, value));
        self
    }

    /// Bind a prebuilt engine-side variable.
    pub fn engine_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Register an initial function.
    pub fn function(mut self, name: impl Into<String>, callable: HostCallable) -> Self {
        self.functions
            .push((name.into(), callable, FnOptions::default()));
        self
    }

    pub fn function_with(
        mut self,
        name: impl Into<String>,
        callable: HostCallable,
        options: FnOptions,
    ) -> Self {
        self.functions.push((name.into(), callable, options));
        self
    }

    /// Register an initial named module.
    pub fn module(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.modules.push((name.into(), source.into()));
        self
    }

    /// Resolution policy for duplicate function names.
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<Script<E>> {
        let mut script = Script {
            engine: self.engine,
            program: None,
            bindings: Scope::from_variables(self.variables),
            functions: FunctionTable::with_policy(self.policy),
            modules: ModuleTable::new(),
        };

        for (name, callable, options) in self.functions {
            script.functions.register_with(name, callable, options);
        }

        for (name, source) in self.modules {
            script.add_module(name, &source)?;
        }

        if let Some(source) = self.source {
            script.parse(&source)?;
        }

        Ok(script)
    }
}

#[cfg(test)]
mod tests;

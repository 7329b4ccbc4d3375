//! Test helpers: a programmable fake engine
//!
//! `FakeEngine` implements the [`Engine`] contract over a one-line command
//! language:
//!
//! - `lit <n>`: evaluate to the integer `n`
//! - `get <name>`: evaluate to the current binding under `name`
//! - `fresh <name> <n>`: finish with a final scope containing ONLY `name`
//! - `use-module <name>`: evaluate to the module's source text, or a
//!   `ModuleNotfound`-tagged value
//! - `call <fn> <n>...`: invoke a registered function positionally
//! - `call-named <fn> k=v...`: invoke with a single scope of named args
//!
//! Parsing `!` fails, standing in for malformed source.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, bail, Context, Result};

use crate::engine::{Engine, Evaluation};
use crate::functions::{BoxFuture, CallArgs, FunctionTable};
use crate::scope::Scope;
use crate::value::Value;

pub struct FakeProgram {
    pub source: String,
}

#[derive(Default)]
pub struct FakeEngine {
    pub parse_calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parses(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }
}

impl Engine for FakeEngine {
    type Tokens = Vec<String>;
    type Program = FakeProgram;

    fn tokenize(&self, source: &str) -> Result<Self::Tokens> {
        Ok(source.split_whitespace().map(str::to_string).collect())
    }

    fn parse(&self, tokens: Self::Tokens) -> Result<Self::Program> {
        if tokens.iter().any(|t| t == "!") {
            bail!("unexpected token `!`");
        }
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        Ok(FakeProgram {
            source: tokens.join(" "),
        })
    }

    fn evaluate<'a>(
        &'a self,
        program: &'a Self::Program,
        bindings: Scope,
        functions: &'a FunctionTable,
        modules: &'a crate::engine::ModuleTable<Self::Program>,
        debug: bool,
    ) -> BoxFuture<'a, Result<Evaluation>> {
        Box::pin(async move {
            if debug {
                tracing::debug!(source = %program.source, "fake evaluation");
            }

            let mut scope = bindings;
            let words: Vec<&str> = program.source.split_whitespace().collect();

            let result = match words.as_slice() {
                [] => Value::None,

                ["lit", n] => Value::Int(n.parse()?),

                ["get", name] => scope.get(name).cloned().unwrap_or(Value::None),

                ["fresh", name, n] => {
                    let mut fresh = Scope::new();
                    fresh.set(*name, Value::Int(n.parse()?));
                    return Ok(Evaluation {
                        result: Value::None,
                        scope: fresh,
                    });
                }

                ["use-module", name] => match modules.get(name) {
                    Some(module) => Value::Str(module.source.clone()),
                    None => Value::with_tag("ModuleNotfound", format!("no module named {name}")),
                },

                ["call", name, args @ ..] => {
                    let values = args
                        .iter()
                        .map(|a| Ok(Value::Int(a.parse()?)))
                        .collect::<Result<Vec<_>>>()?;
                    let call = functions
                        .invoke(name, CallArgs::Positional(values), &scope)
                        .ok_or_else(|| anyhow!("unknown function {name}"))?;
                    let value = call.await?;
                    scope.set("result", value.clone());
                    value
                }

                ["call-named", name, pairs @ ..] => {
                    let mut named = Scope::new();
                    for pair in pairs {
                        let (key, value) = pair
                            .split_once('=')
                            .with_context(|| format!("malformed pair {pair}"))?;
                        named.set(key, Value::Int(value.parse()?));
                    }
                    let call = functions
                        .invoke(name, CallArgs::Named(named), &scope)
                        .ok_or_else(|| anyhow!("unknown function {name}"))?;
                    call.await?
                }

                other => bail!("fake engine cannot evaluate {other:?}"),
            };

            Ok(Evaluation { result, scope })
        })
    }

    fn eval_literal(&self, text: &str) -> Result<Value> {
        Ok(Value::Int(text.trim().parse()?))
    }
}

/// Install a subscriber once so `RUST_LOG` surfaces layer diagnostics in
/// test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lilt_core=trace".into()),
        )
        .with_test_writer()
        .try_init();
}

//! Lifecycle tests: parsing, modules, builder construction

use super::helpers::FakeEngine;
use crate::errors::CallError;
use crate::functions::{FnArgs, HostCallable};
use crate::scope::Variable;
use crate::script::Script;
use crate::value::HostValue;

/* ===================== Parsing ===================== */

#[test]
fn parse_failure_propagates_unchanged() {
    let mut script = Script::new(FakeEngine::new());
    let error = script.parse("lit !").unwrap_err();
    assert!(error.to_string().contains("unexpected token"));
}

#[test]
fn builder_surfaces_parse_failure_at_construction() {
    let result = Script::builder(FakeEngine::new()).source("lit !").build();
    assert!(result.is_err());
}

#[test]
fn parse_reparses_registered_modules() {
    let mut script = Script::new(FakeEngine::new());
    script.parse("lit 1").unwrap();
    script.add_module("web", "lit 2").unwrap();
    assert_eq!(script.engine().parses(), 2);

    // Re-parsing the main program re-parses the module too.
    script.parse("lit 3").unwrap();
    assert_eq!(script.engine().parses(), 4);
}

#[test]
fn malformed_module_source_fails_registration() {
    let mut script = Script::new(FakeEngine::new());
    script.add_module("web", "lit 2").unwrap();
    assert!(script.add_module("bad", "lit !").is_err());
}

/* ===================== Modules ===================== */

#[tokio::test]
async fn module_registration_overwrites_previous_source() {
    let mut script = Script::new(FakeEngine::new());
    script.add_module("web", "lit 1").unwrap();
    script.add_module("web", "lit 2").unwrap();
    script.parse("use-module web").unwrap();

    let result = script.execute(false).await.unwrap();
    assert_eq!(result, Ok(HostValue::Str("lit 2".to_string())));
}

/* ===================== Builder ===================== */

#[tokio::test]
async fn builder_wires_initial_state() {
    let mut script = Script::builder(FakeEngine::new())
        .variable("greeting", "hello")
        .engine_variable(Variable::scope(
            "config",
            vec![Variable::new("retries", 3i64)],
        ))
        .function(
            "double",
            HostCallable::immediate(|call| {
                let FnArgs::Positional(args) = call.args else {
                    return Err(CallError::script("expected positional arguments"));
                };
                let [HostValue::Int(x)] = args.as_slice() else {
                    return Err(CallError::script("expected one integer"));
                };
                Ok(HostValue::Int(x * 2))
            }),
        )
        .module("web", "lit 9")
        .source("call double 21")
        .build()
        .unwrap();

    let variables = script.variables().unwrap();
    assert_eq!(variables.get("greeting"), Some(&HostValue::Str("hello".to_string())));

    let Some(HostValue::Scope(config)) = variables.get("config") else {
        panic!("expected nested scope binding");
    };
    assert_eq!(config.get("retries"), Some(&HostValue::Int(3)));

    let result = script.execute(false).await.unwrap();
    assert_eq!(result, Ok(HostValue::Int(42)));
}

/* ===================== Snapshots ===================== */

#[test]
fn variables_snapshot_is_independent() {
    let mut script = Script::new(FakeEngine::new());
    script.add_variable("x", 1i64);

    let mut snapshot = script.variables().unwrap();
    snapshot.set("x", 99i64);
    snapshot.set("y", "added");

    let fresh = script.variables().unwrap();
    assert_eq!(fresh.get("x"), Some(&HostValue::Int(1)));
    assert!(fresh.get("y").is_none());
}

#[test]
fn nested_scope_bindings_render_indented() {
    let mut script = Script::new(FakeEngine::new());
    script.add_engine_variable(Variable::scope(
        "outer",
        vec![Variable::new("inner", 1i64)],
    ));

    let rendered = script.variables().unwrap().to_string();
    assert_eq!(rendered, "{\n    outer = {\n        inner = 1;\n    };\n}");
}

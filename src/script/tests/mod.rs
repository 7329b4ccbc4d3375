//! Script lifecycle tests
//!
//! Driven through a programmable fake engine so the whole embedding surface
//! (codec, adapters, binding replacement, modules) is exercised end to end
//! without a real evaluator.

mod helpers;

mod lifecycle_tests;

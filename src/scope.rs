//! Binding stores
//!
//! [`Scope`] is the engine-side store: an ordered sequence of [`Variable`]
//! with linear lookup. It doubles as the script's nested scope value type
//! and as a script instance's top-level bindings. [`ScopeMap`] is its
//! decoded host-side counterpart, the type the pretty renderer works on.
//!
//! Update semantics are the same in both: replacing an existing name keeps
//! its position, inserting a new name appends. Iteration order is insertion
//! order and is never reordered by updates.

use std::fmt;

use crate::convert;
use crate::errors::ScriptException;
use crate::value::{HostValue, Value};

/// A name bound to an engine value.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Value,
}

impl Variable {
    /// Bind `name` to a host value, encoding it on the way in.
    pub fn new(name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        Self {
            name: name.into(),
            value: convert::to_value(value.into()),
        }
    }

    /// Bind `name` to a nested scope built from `variables`.
    pub fn scope(name: impl Into<String>, variables: Vec<Variable>) -> Self {
        Self {
            name: name.into(),
            value: Value::Scope(Scope::from_variables(variables)),
        }
    }
}

/// Ordered engine-side binding store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    variables: Vec<Variable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_variables(variables: Vec<Variable>) -> Self {
        let mut scope = Self::new();
        for variable in variables {
            scope.set(variable.name, variable.value);
        }
        scope
    }

    /// Replace the value under `name` in place, or append a new binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(existing) => existing.value = value,
            None => self.variables.push(Variable { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Decode into an independent host-side mapping.
    ///
    /// The result shares nothing with this store; mutating it cannot touch
    /// the bindings. Fails on the first Error-tagged value encountered.
    pub fn to_host_map(&self) -> Result<ScopeMap, ScriptException> {
        self.variables
            .iter()
            .map(|v| Ok((v.name.clone(), convert::to_host(&v.value)?)))
            .collect()
    }
}

impl FromIterator<Variable> for Scope {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        Self::from_variables(iter.into_iter().collect())
    }
}

/// Ordered host-side name→value mapping with a pretty renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeMap {
    entries: Vec<(String, HostValue)>,
}

impl ScopeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value under `name` in place, or append a new entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<HostValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&HostValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HostValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render at `depth` nesting levels. Depth is threaded explicitly so
    /// sibling and reentrant renders cannot interfere.
    pub(crate) fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "{{}}");
        }

        let inner = "    ".repeat(depth + 1);
        writeln!(f, "{{")?;
        for (name, value) in &self.entries {
            write!(f, "{inner}{name} = ")?;
            value.render(f, depth + 1)?;
            writeln!(f, ";")?;
        }
        write!(f, "{}}}", "    ".repeat(depth))
    }
}

impl fmt::Display for ScopeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

impl FromIterator<(String, HostValue)> for ScopeMap {
    fn from_iter<I: IntoIterator<Item = (String, HostValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.set(name, value);
        }
        map
    }
}

impl IntoIterator for ScopeMap {
    type Item = (String, HostValue);
    type IntoIter = std::vec::IntoIter<(String, HostValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl HostValue {
    pub(crate) fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            HostValue::Str(s) => write!(f, "{s:?}"),
            HostValue::Int(n) => write!(f, "{n}"),
            HostValue::Float(x) => write!(f, "{x}"),
            HostValue::Bool(b) => write!(f, "{b}"),
            HostValue::None => write!(f, "none"),
            HostValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.render(f, depth)?;
                }
                write!(f, "]")
            }
            HostValue::Bytes(bytes) => write!(f, "{bytes:?}"),
            HostValue::Scope(map) => map.render(f, depth),
            HostValue::Opaque(object) => write!(f, "{object:?}"),
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

//! Helper Registry: the `VariableMapping`/`FunctionMapping` pair that seeds
//! the expression language with built-in comparators, generators, hooks, and
//! user-supplied entries.
//!
//! Dynamic module introspection is replaced by explicit registration:
//! built-ins are registered first, at construction; callers register their
//! own entries afterward and may shadow a built-in name.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;

/// Ordered name→value mapping. Order preserves declaration order so later
/// entries may reference earlier ones via the expression language.
pub type VariableMapping = IndexMap<String, Value>;

/// A registered callable: `(args, kwargs) -> Result<Value>`.
pub type BuiltinFn = dyn Fn(&[Value], &IndexMap<String, Value>) -> Result<Value> + Send + Sync;

#[derive(Clone)]
struct NamedFn {
    name: &'static str,
    f: Arc<BuiltinFn>,
}

impl fmt::Debug for NamedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFn").field("name", &self.name).finish()
    }
}

/// Name→callable mapping. Populated once at load from built-ins plus user
/// helpers; immutable during a test case run.
#[derive(Debug, Clone, Default)]
pub struct FunctionMapping {
    entries: IndexMap<String, NamedFn>,
}

impl FunctionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under `name`, overwriting any existing entry
    /// (including a built-in) of the same name.
    pub fn register<F>(&mut self, name: &'static str, f: F)
    where
        F: Fn(&[Value], &IndexMap<String, Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            NamedFn {
                name,
                f: Arc::new(f),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn call(&self, name: &str, args: &[Value], kwargs: &IndexMap<String, Value>) -> Option<Result<Value>> {
        self.entries.get(name).map(|entry| (entry.f)(args, kwargs))
    }
}

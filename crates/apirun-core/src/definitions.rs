//! Definition Store: in-memory catalogs of reusable API definitions and
//! test-case definitions, keyed by their declared function-style signature
//! `name(arg1, arg2, …)`.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::expr::parse_function;

/// A flexible, order-preserving JSON object — the shape of a definition or
/// step body. Extra fields pass through merges untouched.
pub type Block = serde_json::Map<String, Value>;

/// A reusable `{request, validate, extract, setup_hooks, teardown_hooks, …}`
/// bundle keyed by its declared signature.
#[derive(Debug, Clone)]
pub struct ApiDefinition {
    pub func_name: String,
    pub declared_args: Vec<Value>,
    pub block: Block,
}

/// A reusable, named sequence of steps, callable via `suite: name(args)`; or
/// an anonymous testcase keyed by source path instead.
#[derive(Debug, Clone)]
pub struct TestcaseDefinition {
    pub func_name: Option<String>,
    pub declared_args: Vec<Value>,
    pub config: Block,
    pub teststeps: Vec<Block>,
}

/// In-memory catalogs of API and testcase/suite definitions. Outlives any
/// single run; read-only during execution.
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    apis: IndexMap<String, ApiDefinition>,
    testcases: IndexMap<String, TestcaseDefinition>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an API definition parsed from a `def: "name(args)"` field.
    /// Re-registering an existing `func_name` overwrites it and logs a
    /// warning.
    pub fn insert_api(&mut self, def_signature: &str, mut block: Block) -> Result<()> {
        let meta = parse_function(def_signature)?;
        if self.apis.contains_key(&meta.func_name) {
            tracing::warn!(func_name = %meta.func_name, "API definition duplicated, overwriting");
        }
        block.remove("def");
        self.apis.insert(
            meta.func_name.clone(),
            ApiDefinition {
                func_name: meta.func_name,
                declared_args: meta.args,
                block,
            },
        );
        Ok(())
    }

    /// Register a named testcase/suite definition parsed from a
    /// `config.def: "name(args)"` field.
    pub fn insert_named_testcase(&mut self, def_signature: &str, config: Block, teststeps: Vec<Block>) -> Result<()> {
        let meta = parse_function(def_signature)?;
        if self.testcases.contains_key(&meta.func_name) {
            tracing::warn!(func_name = %meta.func_name, "testcase definition duplicated, overwriting");
        }
        self.testcases.insert(
            meta.func_name.clone(),
            TestcaseDefinition {
                func_name: Some(meta.func_name),
                declared_args: meta.args,
                config,
                teststeps,
            },
        );
        Ok(())
    }

    /// Register an anonymous testcase, keyed by its source path.
    pub fn insert_anonymous_testcase(&mut self, path: &str, config: Block, teststeps: Vec<Block>) {
        if self.testcases.contains_key(path) {
            tracing::warn!(path, "testcase at path already loaded, overwriting");
        }
        self.testcases.insert(
            path.to_string(),
            TestcaseDefinition {
                func_name: None,
                declared_args: Vec::new(),
                config,
                teststeps,
            },
        );
    }

    pub fn get_api(&self, func_name: &str) -> Result<&ApiDefinition> {
        self.apis.get(func_name).ok_or_else(|| Error::api_not_found(func_name))
    }

    pub fn get_testcase(&self, key: &str) -> Result<&TestcaseDefinition> {
        self.testcases.get(key).ok_or_else(|| Error::testcase_not_found(key))
    }

    pub fn apis(&self) -> impl Iterator<Item = &ApiDefinition> {
        self.apis.values()
    }

    pub fn testcases(&self) -> impl Iterator<Item = &TestcaseDefinition> {
        self.testcases.values()
    }
}

//! Core of the data-driven API test runner: the definition loader's target
//! types, the expression/template engine, and the execution context. No
//! file I/O, no HTTP, no CLI parsing — those are external collaborators
//! implemented one layer up (see `apirun-cli`).

pub mod assembler;
pub mod comparators;
pub mod context;
pub mod csv_source;
pub mod definitions;
pub mod error;
pub mod expr;
pub mod merge;
pub mod parameters;
pub mod registry;
pub mod response;
pub mod substitute;
pub mod validator;

pub use context::{ExecutionContext, Scope};
pub use definitions::{ApiDefinition, Block, DefinitionStore, TestcaseDefinition};
pub use error::{Error, Failure, Result};
pub use registry::{FunctionMapping, VariableMapping};
pub use response::ResponseObject;

/// Build a `FunctionMapping` seeded with every built-in comparator and
/// generator. Callers layer `csv_source::register_parameterize`
/// and any project-specific helpers on top before passing it to
/// `ExecutionContext::new`.
pub fn builtin_functions() -> FunctionMapping {
    let mut funcs = FunctionMapping::new();
    comparators::register_builtins(&mut funcs);
    funcs
}

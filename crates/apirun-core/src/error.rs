//! Error types for apirun-core.

/// Result type alias for pipeline operations (load/assemble/resolve).
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline defects: abort loading or execution of the affected case.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file format error: {message}")]
    FileFormat { message: String },

    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("parameter error: {message}")]
    Param { message: String },

    #[error("function not found: {name}")]
    FunctionNotFound { name: String },

    #[error("variable not found: {name}")]
    VariableNotFound { name: String },

    #[error("api definition not found: {name}")]
    ApiNotFound { name: String },

    #[error("testcase definition not found: {name}")]
    TestcaseNotFound { name: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    pub fn file_format<S: Into<String>>(message: S) -> Self {
        Self::FileFormat {
            message: message.into(),
        }
    }

    pub fn file_not_found<S: Into<String>>(path: S) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn param<S: Into<String>>(message: S) -> Self {
        Self::Param {
            message: message.into(),
        }
    }

    pub fn function_not_found<S: Into<String>>(name: S) -> Self {
        Self::FunctionNotFound { name: name.into() }
    }

    pub fn variable_not_found<S: Into<String>>(name: S) -> Self {
        Self::VariableNotFound { name: name.into() }
    }

    pub fn api_not_found<S: Into<String>>(name: S) -> Self {
        Self::ApiNotFound { name: name.into() }
    }

    pub fn testcase_not_found<S: Into<String>>(name: S) -> Self {
        Self::TestcaseNotFound { name: name.into() }
    }
}

/// Test-level negative outcomes: mark a step/case failed without aborting the run.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("{0}")]
    Validation(String),

    #[error("extract failure: {0}")]
    Extract(String),

    #[error("setup hooks failure: {0}")]
    SetupHooks(String),

    #[error("teardown hooks failure: {0}")]
    TeardownHooks(String),
}

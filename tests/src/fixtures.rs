//! Shared fixtures for cross-crate integration tests: a canned
//! `ResponseObject` implementation and small JSON-construction helpers, so
//! individual test files can focus on the pipeline stage under test.

use apirun_core::definitions::Block;
use apirun_core::error::Result;
use apirun_core::response::ResponseObject;
use indexmap::IndexMap;
use serde_json::Value;

/// A canned HTTP response, standing in for the real HTTP Driver in tests
/// that only need to exercise validator/extractor evaluation.
pub struct FakeResponse {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: Value,
}

impl FakeResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, headers: IndexMap::new(), body }
    }
}

impl ResponseObject for FakeResponse {
    fn extract_field(&self, path: &str) -> Result<Value> {
        if path == "status_code" {
            return Ok(Value::from(self.status));
        }
        if let Some(header_name) = path.strip_prefix("headers.") {
            return self
                .headers
                .get(header_name)
                .cloned()
                .map(Value::String)
                .ok_or_else(|| apirun_core::error::Error::param(format!("header not found: {header_name}")));
        }
        let body_path = path.strip_prefix("content.").or_else(|| path.strip_prefix("body.")).unwrap_or(path);
        let mut current = &self.body;
        for segment in body_path.split('.') {
            current = current
                .get(segment)
                .ok_or_else(|| apirun_core::error::Error::param(format!("field not found: {path}")))?;
        }
        Ok(current.clone())
    }

    fn status_code(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    fn body(&self) -> &Value {
        &self.body
    }
}

/// Build a `Block` from a `json!` object literal.
pub fn block(value: Value) -> Block {
    value.as_object().expect("fixture value must be a JSON object").clone()
}

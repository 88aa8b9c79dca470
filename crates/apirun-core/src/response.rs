//! External-collaborator interface for the HTTP response object
//! the core only needs `extract_field(path)` plus basic
//! accessors to evaluate validators and extractors against a response.

use serde_json::Value;

use crate::error::Result;

/// A resolved HTTP response, as seen by validator and extractor evaluation.
/// Implemented by the HTTP Driver one layer above the core.
pub trait ResponseObject {
    /// Navigate a dot/bracket field path (e.g. `content.token`,
    /// `headers.Content-Type`, `status_code`) and return the value found.
    fn extract_field(&self, path: &str) -> Result<Value>;

    fn status_code(&self) -> u16;

    fn headers(&self) -> &indexmap::IndexMap<String, String>;

    fn body(&self) -> &Value;
}

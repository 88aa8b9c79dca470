//! HTTP Driver: issues a resolved request with an async HTTP client and
//! adapts the response into the core's `ResponseObject` trait, so
//! validator/extractor evaluation never depends on the transport.

use std::time::Duration;

use apirun_core::error::{Error, Result};
use apirun_core::response::ResponseObject;
use indexmap::IndexMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;

/// A fully-issued request/response pair, captured so validators and
/// extractors can inspect the response after the fact.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    status: u16,
    headers: IndexMap<String, String>,
    body: Value,
}

fn navigate_body<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        let (key, index) = match segment.split_once('[') {
            Some((key, rest)) => {
                let idx: usize = rest.trim_end_matches(']').parse().ok()?;
                (key, Some(idx))
            }
            None => (segment, None),
        };
        current = if key.is_empty() { current } else { current.get(key)? };
        if let Some(idx) = index {
            current = current.get(idx)?;
        }
    }
    Some(current)
}

impl ResponseObject for CapturedResponse {
    /// Navigate `status_code`, `headers.<name>`, or a `content.`/`body.`
    /// prefixed dot/bracket path into the decoded JSON body.
    fn extract_field(&self, path: &str) -> Result<Value> {
        if path == "status_code" {
            return Ok(Value::from(self.status));
        }
        if let Some(header_name) = path.strip_prefix("headers.") {
            return self
                .headers
                .get(header_name)
                .map(|v| Value::String(v.clone()))
                .ok_or_else(|| Error::param(format!("header not found: {header_name}")));
        }
        let body_path = path.strip_prefix("content.").or_else(|| path.strip_prefix("body.")).unwrap_or(path);
        navigate_body(&self.body, body_path)
            .cloned()
            .ok_or_else(|| Error::param(format!("field not found in response body: {path}")))
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

/// Issues resolved requests over HTTP and captures their responses.
#[derive(Debug, Clone)]
pub struct HttpDriver {
    client: reqwest::Client,
}

impl Default for HttpDriver {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpDriver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("reqwest client builder"),
        }
    }

    /// Send the fully-resolved `request` block. Expects `method`, `url`, and
    /// optionally `headers`/`params`/`json`/`data`, mirroring the request
    /// shape a test step resolves to after `ExecutionContext::get_parsed_request`.
    pub async fn send(&self, request: &Value) -> anyhow::Result<CapturedResponse> {
        let method_str = request.get("method").and_then(Value::as_str).unwrap_or("GET");
        let method = Method::from_bytes(method_str.as_bytes())?;
        let url = request
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("request is missing a 'url' field"))?;

        let mut builder = self.client.request(method, url);

        if let Some(headers) = request.get("headers").and_then(Value::as_object) {
            for (key, value) in headers {
                let value_str = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                builder = builder.header(key, value_str);
            }
        }

        if let Some(params) = request.get("params").and_then(Value::as_object) {
            let pairs: Vec<(String, String)> = params
                .iter()
                .map(|(k, v)| (k.clone(), match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }))
                .collect();
            builder = builder.query(&pairs);
        }

        if let Some(json_body) = request.get("json") {
            builder = builder.json(json_body);
        } else if let Some(data) = request.get("data") {
            builder = builder.json(data);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(CapturedResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Build an uninterpreted `CapturedResponse` directly (used by callers that
/// already hold a decoded status/headers/body triple, e.g. in tests).
pub fn captured_response(status: StatusCode, headers: IndexMap<String, String>, body: Value) -> CapturedResponse {
    CapturedResponse {
        status: status.as_u16(),
        headers,
        body,
    }
}

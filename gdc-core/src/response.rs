//! # Response wrapper
//!
//! [`ApiResponse`] pairs the raw response metadata (status, headers, final
//! URL) with the body text, which the transport reads eagerly before the
//! wrapper is constructed. The body is parsed as JSON on demand; a body
//! that is not valid JSON is handed back as a plain string value.

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A fully-received HTTP response. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: String,
    body: String,
}

impl ApiResponse {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, url: String, body: String) -> Self {
        Self {
            status,
            headers,
            url,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status is in the 2xx success range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Value of the given response header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The URL this response was ultimately served from (after redirects).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The raw body text.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// The body parsed as JSON. A body that does not parse is returned
    /// verbatim as a JSON string value.
    pub fn data(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }

    /// The body deserialized into a concrete type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

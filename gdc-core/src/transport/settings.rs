//! # Request settings builder
//!
//! Produces a fully-resolved [`RequestDescriptor`] from three layers of
//! settings merged in increasing precedence: built-in defaults, the
//! process-wide override bag from [`ConfigStorage`], and the call-site
//! [`RequestSettings`]. Header maps merge key-by-key; every other field is
//! last-wins. This is a pure transformation, no I/O and no validation.
//!
//! [`ConfigStorage`]: crate::config::ConfigStorage

use crate::config::{ConfigSnapshot, PackageInfo};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::time::Duration;

/// Delay between transport-level polls of a 202 response.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(1000);

pub const HEADER_PKG: HeaderName = HeaderName::from_static("x-gdc-js-pkg");
pub const HEADER_PKG_VERSION: HeaderName = HeaderName::from_static("x-gdc-js-pkg-version");

/// Request body, serialized at descriptor-build time.
#[derive(Debug, Clone)]
pub enum Body {
    Json(Value),
    Text(String),
}

/// Per-call (or process-wide) request settings. Unset fields fall through
/// to the lower-precedence layer.
#[derive(Debug, Clone, Default)]
pub struct RequestSettings {
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub body: Option<Body>,
    pub poll_delay: Option<Duration>,
    pub dont_poll_on_result: Option<bool>,
    /// Cap on transport-level 202 polling. `None` keeps dispatching for as
    /// long as the server returns 202.
    pub max_poll_attempts: Option<u32>,
}

impl RequestSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Text(body.into()));
        self
    }

    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = Some(delay);
        self
    }

    pub fn dont_poll_on_result(mut self, dont_poll: bool) -> Self {
        self.dont_poll_on_result = Some(dont_poll);
        self
    }

    pub fn max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = Some(attempts);
        self
    }

    /// Merge `other` over `self`: set fields of `other` win, headers merge
    /// key-by-key.
    fn overlay(&mut self, other: &RequestSettings) {
        if let Some(method) = &other.method {
            self.method = Some(method.clone());
        }
        for (name, value) in &other.headers {
            self.headers.insert(name.clone(), value.clone());
        }
        if let Some(body) = &other.body {
            self.body = Some(body.clone());
        }
        if let Some(delay) = other.poll_delay {
            self.poll_delay = Some(delay);
        }
        if let Some(dont_poll) = other.dont_poll_on_result {
            self.dont_poll_on_result = Some(dont_poll);
        }
        if let Some(attempts) = other.max_poll_attempts {
            self.max_poll_attempts = Some(attempts);
        }
    }
}

/// Origin mode of the outgoing request, computed from domain presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    SameOrigin,
    Cors,
}

/// Which credentials travel with the request, computed from domain presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsMode {
    SameOrigin,
    Include,
}

/// A fully-resolved request, ready for dispatch.
#[derive(Debug, Clone)]
pub(crate) struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub mode: RequestMode,
    pub credentials: CredentialsMode,
    pub poll_delay: Duration,
    pub dont_poll_on_result: bool,
    pub max_poll_attempts: Option<u32>,
}

/// Resolve the three settings layers into a dispatchable descriptor.
pub(crate) fn build_request(
    config: &ConfigSnapshot,
    url: &str,
    call_settings: &RequestSettings,
) -> RequestDescriptor {
    let mut merged = default_settings(&config.origin_package);
    merged.overlay(&config.request_settings);
    merged.overlay(call_settings);

    let (url, mode, credentials) = enrich_with_custom_domain(url, config.domain.as_deref());

    RequestDescriptor {
        url,
        method: merged.method.unwrap_or(Method::GET),
        headers: merged.headers,
        body: merged.body.map(|body| match body {
            // `Value` serialization through `Display` cannot fail
            Body::Json(value) => value.to_string(),
            Body::Text(text) => text,
        }),
        mode,
        credentials,
        poll_delay: merged.poll_delay.unwrap_or(DEFAULT_POLL_DELAY),
        dont_poll_on_result: merged.dont_poll_on_result.unwrap_or(false),
        max_poll_attempts: merged.max_poll_attempts,
    }
}

fn default_settings(package: &PackageInfo) -> RequestSettings {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(name) = HeaderValue::from_str(&package.name) {
        headers.insert(HEADER_PKG, name);
    }
    if let Ok(version) = HeaderValue::from_str(&package.version) {
        headers.insert(HEADER_PKG_VERSION, version);
    }

    RequestSettings {
        headers,
        ..RequestSettings::default()
    }
}

/// Prefix the URL with the custom domain and switch to cross-origin
/// credentials. The prefix is only applied when not already present, so a
/// descriptor rebuilt for a retry is not prefixed twice.
fn enrich_with_custom_domain(
    url: &str,
    domain: Option<&str>,
) -> (String, RequestMode, CredentialsMode) {
    match domain {
        Some(domain) => {
            let url = if url.starts_with(domain) {
                url.to_string()
            } else {
                format!("{domain}{url}")
            };
            (url, RequestMode::Cors, CredentialsMode::Include)
        }
        None => (
            url.to_string(),
            RequestMode::SameOrigin,
            CredentialsMode::SameOrigin,
        ),
    }
}

//! # Process-wide configuration
//!
//! [`ConfigStorage`] holds the settings consulted on every request: the
//! optional custom domain, the request-settings override bag and the
//! package identification sent in the `X-GDC-JS-PKG` headers.
//!
//! The storage is a cheap shared handle. SDK modules clone it freely and
//! read it on every call; it is mutated only through the explicit setters
//! here, never by request logic. [`ConfigStorage::detach`] produces an
//! independent deep copy for a second SDK instance.

use crate::transport::settings::RequestSettings;
use parking_lot::RwLock;
use std::sync::Arc;

/// Name and version reported to the platform via the package headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid custom domain '{0}'. Expected '[http(s)://]host' with no path")]
    InvalidDomain(String),
}

#[derive(Debug, Default)]
struct ConfigState {
    domain: Option<String>,
    request_settings: RequestSettings,
    origin_package: PackageInfo,
}

/// Shared, setter-mutated configuration consulted on every request.
#[derive(Debug, Clone, Default)]
pub struct ConfigStorage {
    state: Arc<RwLock<ConfigState>>,
}

/// A read-only copy of the configuration taken at the start of a request.
#[derive(Debug, Clone)]
pub(crate) struct ConfigSnapshot {
    pub domain: Option<String>,
    pub request_settings: RequestSettings,
    pub origin_package: PackageInfo,
}

impl ConfigStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or clear) the custom domain all request URLs are prefixed with.
    ///
    /// Accepts `https://host`, `http://host` or a bare `host` (scheme
    /// defaults to `https`); a single trailing slash is stripped. Anything
    /// carrying a path is rejected.
    pub fn set_custom_domain(&self, domain: Option<&str>) -> Result<(), ConfigError> {
        let sanitized = domain.map(sanitize_domain).transpose()?;
        self.state.write().domain = sanitized;
        Ok(())
    }

    pub fn custom_domain(&self) -> Option<String> {
        self.state.read().domain.clone()
    }

    /// Replace the process-wide request-settings override bag. These
    /// settings are merged into every request between the built-in defaults
    /// and the call-site settings.
    pub fn set_request_settings(&self, settings: RequestSettings) {
        self.state.write().request_settings = settings;
    }

    /// Override the package identification sent with every request.
    pub fn set_origin_package(&self, name: &str, version: &str) {
        self.state.write().origin_package = PackageInfo {
            name: name.to_string(),
            version: version.to_string(),
        };
    }

    /// An independent deep copy of the current configuration. Changes to
    /// either copy are not observed by the other.
    pub fn detach(&self) -> ConfigStorage {
        let state = self.state.read();
        ConfigStorage {
            state: Arc::new(RwLock::new(ConfigState {
                domain: state.domain.clone(),
                request_settings: state.request_settings.clone(),
                origin_package: state.origin_package.clone(),
            })),
        }
    }

    pub(crate) fn snapshot(&self) -> ConfigSnapshot {
        let state = self.state.read();
        ConfigSnapshot {
            domain: state.domain.clone(),
            request_settings: state.request_settings.clone(),
            origin_package: state.origin_package.clone(),
        }
    }
}

fn sanitize_domain(domain: &str) -> Result<String, ConfigError> {
    let trimmed = domain.strip_suffix('/').unwrap_or(domain);
    let (scheme, host) = if let Some(host) = trimmed.strip_prefix("https://") {
        ("https", host)
    } else if let Some(host) = trimmed.strip_prefix("http://") {
        ("http", host)
    } else {
        ("https", trimmed)
    };

    if host.is_empty() || host.contains('/') || host.contains('?') {
        return Err(ConfigError::InvalidDomain(domain.to_string()));
    }

    Ok(format!("{scheme}://{host}"))
}

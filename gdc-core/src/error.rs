//! # Error taxonomy
//!
//! Every public operation in this crate fails with [`ApiError`]. The variants
//! keep the distinction between "the request never reached the server" and
//! "the server answered with an error status", and carry the raw
//! [`ApiResponse`] whenever one was received so callers can inspect the
//! status code and body (e.g. to detect platform error codes embedded in
//! the response).
//!
//! [`ApiError`] is `Clone`: the outcome of a session-token refresh is shared
//! between every request that was waiting on it.

use crate::response::ApiResponse;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server or no response was received
    /// (connection refused, DNS failure, client-side timeout).
    #[error("Request failed before reaching the server: {source}")]
    Network {
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// The login endpoint rejected the credentials, the session-token
    /// refresh itself failed, or a request still got 401 after a refresh.
    #[error("Unauthorized")]
    Unauthorized { response: Option<ApiResponse> },

    /// The server answered with an error status (400-599) that is not
    /// handled transparently by the transport.
    #[error("Server responded with '{status_text}'")]
    Response {
        status_text: String,
        response: ApiResponse,
    },

    /// Polling gave up after the configured number of attempts without
    /// observing a terminal response.
    #[error("Polling did not finish within {attempts} attempts")]
    PollTimeout {
        attempts: u32,
        last: Option<ApiResponse>,
    },
}

impl ApiError {
    pub(crate) fn network(source: reqwest::Error) -> Self {
        Self::Network {
            source: Arc::new(source),
        }
    }

    pub(crate) fn from_error_status(response: ApiResponse) -> Self {
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string();
        Self::Response {
            status_text,
            response,
        }
    }

    /// The server response carried by this error, when one was received.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Network { .. } => None,
            Self::Unauthorized { response } => response.as_ref(),
            Self::Response { response, .. } => Some(response),
            Self::PollTimeout { last, .. } => last.as_ref(),
        }
    }

    /// Whether this error is an authentication failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

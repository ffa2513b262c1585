//! # Bounded task pollers
//!
//! Helpers for callers that wait on long-running server-side tasks with
//! their own completion predicates (ETL pulls, model management, result
//! export). Unlike the transport's 202 handling, these pollers bound the
//! number of attempts and leave "done" detection to the caller:
//!
//! * [`poll_for_result`] asks the predicate about the parsed response body.
//! * [`poll_for_headers`] asks the predicate about the status and headers
//!   only, and resolves with the polled location on a final 200.
//!
//! Both are plain loops with awaited sleeps; one chain never has two poll
//! steps in flight.

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::transport::{RequestSettings, Transport};
use http::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
pub const DEFAULT_POLL_STEP: Duration = Duration::from_millis(5000);

/// Attempt bounding for the caller-level pollers.
#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
    pub max_attempts: u32,
    pub poll_step: Duration,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_step: DEFAULT_POLL_STEP,
        }
    }
}

impl PollingOptions {
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn poll_step(mut self, poll_step: Duration) -> Self {
        self.poll_step = poll_step;
        self
    }
}

/// Location of a finished task, resolved by [`poll_for_headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledUri {
    pub uri: String,
}

/// Poll `uri` until `is_done` accepts the parsed response body.
///
/// The terminal body is returned verbatim; interpreting it as task success
/// or task failure is up to the caller. Attempts past `max_attempts` reject
/// with [`ApiError::PollTimeout`] carrying the last response.
pub async fn poll_for_result<F>(
    transport: &Transport,
    uri: &str,
    is_done: F,
    options: PollingOptions,
) -> Result<Value, ApiError>
where
    F: Fn(&Value) -> bool,
{
    let mut attempts: u32 = 0;

    loop {
        let response = transport.get(uri, RequestSettings::new()).await?;
        let data = response.data();

        if attempts > options.max_attempts {
            return Err(ApiError::PollTimeout {
                attempts,
                last: Some(response),
            });
        }
        if is_done(&data) {
            return Ok(data);
        }

        attempts += 1;
        debug!(uri, attempts, "task not finished yet");
        tokio::time::sleep(options.poll_step).await;
    }
}

/// Poll `uri` until `is_done` accepts the response status and headers.
///
/// The polls are issued with transport 202-polling disabled so the
/// predicate sees intermediate statuses itself. A final 200 resolves with
/// the polled location; any other final status rejects with the response
/// mapped to an error.
pub async fn poll_for_headers<F>(
    transport: &Transport,
    uri: &str,
    is_done: F,
    options: PollingOptions,
) -> Result<PolledUri, ApiError>
where
    F: Fn(StatusCode, &ApiResponse) -> bool,
{
    let mut attempts: u32 = 0;

    loop {
        let response = transport
            .get(uri, RequestSettings::new().dont_poll_on_result(true))
            .await?;

        if attempts > options.max_attempts {
            return Err(ApiError::PollTimeout {
                attempts,
                last: Some(response),
            });
        }
        if is_done(response.status(), &response) {
            if response.status() == StatusCode::OK {
                return Ok(PolledUri {
                    uri: uri.to_string(),
                });
            }
            return Err(ApiError::from_error_status(response));
        }

        attempts += 1;
        debug!(uri, attempts, "task not finished yet");
        tokio::time::sleep(options.poll_step).await;
    }
}

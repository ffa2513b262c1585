//! # Authenticated request transport
//!
//! This module wraps an HTTP client with the platform's authentication and
//! long-running-task conventions, so callers see only final results:
//!
//! * **Session-token expiry**: a 401 pauses the request, refreshes the
//!   session token and retries the original request once. Any number of
//!   requests failing concurrently share a single refresh call.
//! * **Polling**: a 202 response means "still processing"; the transport
//!   keeps re-dispatching GETs against the follow-up location until a
//!   terminal status arrives and resolves with that final response only.
//! * **Error classification**: transport-level failures and error statuses
//!   are mapped to the [`ApiError`] taxonomy, carrying the raw response
//!   for inspection.
//!
//! The 401 handling is skipped for the login endpoint itself, where a 401
//! simply means wrong credentials.
pub mod settings;

pub use settings::{Body, CredentialsMode, RequestMode, RequestSettings};

use crate::config::ConfigStorage;
use crate::error::ApiError;
use crate::response::ApiResponse;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use http::{Method, StatusCode};
use parking_lot::Mutex;
use settings::{RequestDescriptor, build_request};
use std::sync::Arc;
use tracing::{debug, warn};

/// Path of the session-token endpoint. A refresh is a `POST` here.
pub const TOKEN_PATH: &str = "/gdc/account/token";

/// Path of the login endpoint. A 401 from here means wrong credentials and
/// must not trigger a token refresh.
pub const LOGIN_PATH: &str = "/gdc/account/login";

/// A pending session-token refresh, shared by every request waiting on it.
type TokenRefresh = Shared<BoxFuture<'static, Result<(), ApiError>>>;

/// The authenticated request transport. Cheap to clone; clones share the
/// underlying HTTP client, cookie jar and token-refresh state.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

struct Inner {
    http: reqwest::Client,
    config: ConfigStorage,
    /// At most one refresh request is in flight at any time; concurrent
    /// 401s attach to this slot instead of starting their own.
    token_refresh: Mutex<Option<TokenRefresh>>,
}

impl Transport {
    /// Build a transport over a cookie-keeping HTTP client. The session
    /// token travels as a cookie, so the jar is what makes a refreshed
    /// session visible to retried requests.
    pub fn new(config: ConfigStorage) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(ApiError::network)?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                token_refresh: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ConfigStorage {
        &self.inner.config
    }

    /// Dispatch a request and resolve with the final response, after any
    /// transparent token refresh and 202 polling.
    ///
    /// Statuses 200-399 (except 202) resolve with the [`ApiResponse`];
    /// everything else rejects with an [`ApiError`]. A 401 from a non-login
    /// URL is retried exactly once after a successful token refresh; a 202
    /// re-dispatches against the `Location` header (falling back to the
    /// response's own URL) as a bodyless GET after `poll_delay`, for as
    /// long as 202 keeps being returned or until `max_poll_attempts` is
    /// exhausted when one is set.
    pub async fn ajax(
        &self,
        url: &str,
        settings: RequestSettings,
    ) -> Result<ApiResponse, ApiError> {
        let mut request_url = url.to_string();
        let mut auth_retried = false;
        let mut polling = false;
        let mut poll_attempts: u32 = 0;

        loop {
            // A pending refresh wins over everything: wait for it to settle
            // before dispatching, sharing its failure if it has one.
            if let Some(pending) = self.pending_token_refresh() {
                pending.await?;
            }

            let mut descriptor =
                build_request(&self.inner.config.snapshot(), &request_url, &settings);
            if polling {
                descriptor.method = Method::GET;
                descriptor.body = None;
            }

            let response = self.send(&descriptor).await?;
            let status = response.status();
            debug!(status = status.as_u16(), url = %descriptor.url, "received response");

            if status == StatusCode::UNAUTHORIZED {
                // wrong credentials on the login endpoint itself, or the
                // retried request is still rejected: terminal
                if descriptor.url.contains(LOGIN_PATH) || auth_retried {
                    return Err(ApiError::Unauthorized {
                        response: Some(response),
                    });
                }
                self.trigger_or_join_token_refresh().await?;
                auth_retried = true;
                continue;
            }

            if status == StatusCode::ACCEPTED && !descriptor.dont_poll_on_result {
                if let Some(cap) = descriptor.max_poll_attempts {
                    if poll_attempts >= cap {
                        return Err(ApiError::PollTimeout {
                            attempts: poll_attempts,
                            last: Some(response),
                        });
                    }
                }
                poll_attempts += 1;

                // poll on the provided location, falling back to wherever
                // the response was served from (e.g. after a redirect)
                request_url = response
                    .header("location")
                    .map(str::to_string)
                    .unwrap_or_else(|| response.url().to_string());
                polling = true;
                auth_retried = false;
                tokio::time::sleep(descriptor.poll_delay).await;
                continue;
            }

            if (200..400).contains(&status.as_u16()) {
                return Ok(response);
            }

            return Err(ApiError::from_error_status(response));
        }
    }

    /// `ajax` with method GET.
    pub async fn get(&self, url: &str, settings: RequestSettings) -> Result<ApiResponse, ApiError> {
        self.ajax(url, settings.method(Method::GET)).await
    }

    /// `ajax` with method POST.
    pub async fn post(
        &self,
        url: &str,
        settings: RequestSettings,
    ) -> Result<ApiResponse, ApiError> {
        self.ajax(url, settings.method(Method::POST)).await
    }

    /// `ajax` with method PUT.
    pub async fn put(&self, url: &str, settings: RequestSettings) -> Result<ApiResponse, ApiError> {
        self.ajax(url, settings.method(Method::PUT)).await
    }

    /// `ajax` with method DELETE.
    pub async fn delete(
        &self,
        url: &str,
        settings: RequestSettings,
    ) -> Result<ApiResponse, ApiError> {
        self.ajax(url, settings.method(Method::DELETE)).await
    }

    async fn send(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        debug!(
            method = %descriptor.method,
            url = %descriptor.url,
            mode = ?descriptor.mode,
            credentials = ?descriptor.credentials,
            "dispatching request"
        );

        let mut builder = self
            .inner
            .http
            .request(descriptor.method.clone(), descriptor.url.as_str())
            .headers(descriptor.headers.clone());
        if let Some(body) = &descriptor.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(ApiError::network)?;
        read_response(response).await
    }

    fn pending_token_refresh(&self) -> Option<TokenRefresh> {
        self.inner.token_refresh.lock().clone()
    }

    /// Join the pending token refresh, or start a new one when none is in
    /// flight. The returned future settles with the shared outcome and the
    /// slot is cleared once it does, so a later 401 starts over instead of
    /// reusing a settled refresh.
    fn trigger_or_join_token_refresh(&self) -> TokenRefresh {
        let mut slot = self.inner.token_refresh.lock();
        if let Some(pending) = slot.as_ref() {
            return pending.clone();
        }

        debug!("session token expired, requesting a new one");
        let http = self.inner.http.clone();
        let config = self.inner.config.clone();
        let cleanup = Arc::downgrade(&self.inner);

        let refresh = async move {
            let result = refresh_session_token(&http, &config).await;
            if let Some(inner) = cleanup.upgrade() {
                *inner.token_refresh.lock() = None;
            }
            if let Err(error) = &result {
                warn!(error = %error, "session token refresh failed");
            }
            result
        }
        .boxed()
        .shared();

        *slot = Some(refresh.clone());
        refresh
    }
}

/// One refresh request against the token endpoint. A refresh that is itself
/// rejected is terminal and surfaces as [`ApiError::Unauthorized`].
async fn refresh_session_token(
    http: &reqwest::Client,
    config: &ConfigStorage,
) -> Result<(), ApiError> {
    let descriptor = build_request(
        &config.snapshot(),
        TOKEN_PATH,
        &RequestSettings::new().method(Method::POST),
    );

    debug!(url = %descriptor.url, "refreshing session token");
    let response = http
        .request(descriptor.method.clone(), descriptor.url.as_str())
        .headers(descriptor.headers.clone())
        .send()
        .await
        .map_err(ApiError::network)?;
    let response = read_response(response).await?;

    if (200..400).contains(&response.status().as_u16()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized {
            response: Some(response),
        })
    }
}

/// Read the full body eagerly so it is available even when the caller never
/// inspects it.
async fn read_response(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().to_string();
    let body = response.text().await.map_err(ApiError::network)?;

    Ok(ApiResponse::new(status, headers, url, body))
}

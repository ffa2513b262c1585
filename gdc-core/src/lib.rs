//! # GDC Core
//!
//! `gdc-core` is a client SDK for the GDC analytics platform REST API. Its
//! heart is the [`transport::Transport`]: an authenticated request layer
//! that transparently handles session-token expiry (with a single shared
//! refresh for any number of concurrently failing requests) and
//! long-running server-side jobs (202 "keep polling" responses), so
//! callers only ever see final results.
//!
//! ## Key Components
//!
//! * **[`Sdk`]:** The main entry point, wiring configuration, transport
//!   and the account API over one shared session.
//! * **[`transport::Transport`]:** The authenticated request transport.
//!   Resolves with an [`response::ApiResponse`] (status, headers, lazily
//!   parsed JSON body) or rejects with an [`error::ApiError`].
//! * **[`polling`]:** Bounded pollers for callers waiting on long-running
//!   tasks with their own completion predicates.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gdc_core::Sdk;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let sdk = Sdk::new()?;
//! sdk.config().set_custom_domain(Some("https://secure.example.com"))?;
//!
//! sdk.user().login("bear@gooddata.com", "secret").await?;
//!
//! let projects = sdk
//!     .xhr()
//!     .get("/gdc/md/projectId/query/projects", Default::default())
//!     .await?;
//! println!("{}", projects.data());
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `http` and `serde_json` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod config;
pub mod error;
pub mod paging;
pub mod polling;
pub mod response;
pub mod transport;
pub mod user;

mod sdk;

pub use error::ApiError;
pub use response::ApiResponse;
pub use sdk::Sdk;

// Re-exports
pub use http;
pub use serde_json;

//! SDK facade wiring the configuration, the transport and the API modules
//! over one shared session.

use crate::config::ConfigStorage;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::user::UserApi;

/// One authenticated session against the platform.
///
/// All parts of an `Sdk` share a single [`ConfigStorage`] and a single
/// [`Transport`] (and therefore one cookie jar and one token-refresh
/// state). Use [`Sdk::detach`] for a second, independent session.
#[derive(Debug, Clone)]
pub struct Sdk {
    config: ConfigStorage,
    xhr: Transport,
    user: UserApi,
}

impl Sdk {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(ConfigStorage::new())
    }

    pub fn with_config(config: ConfigStorage) -> Result<Self, ApiError> {
        let xhr = Transport::new(config.clone())?;
        let user = UserApi::new(xhr.clone());
        Ok(Self { config, xhr, user })
    }

    pub fn config(&self) -> &ConfigStorage {
        &self.config
    }

    /// The authenticated request transport, for endpoints without a
    /// dedicated module.
    pub fn xhr(&self) -> &Transport {
        &self.xhr
    }

    pub fn user(&self) -> &UserApi {
        &self.user
    }

    /// A fully independent copy: detached configuration, fresh cookie jar,
    /// fresh token-refresh state. Nothing is shared with `self`.
    pub fn detach(&self) -> Result<Sdk, ApiError> {
        Self::with_config(self.config.detach())
    }
}

//! # Account and session management
//!
//! [`UserApi`] is the authentication entry point: `login` must succeed
//! before any protected call, after which the session travels in the
//! transport's cookie jar and every subsequent call is authenticated
//! (re-authenticated transparently on token expiry by the transport).

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::transport::{LOGIN_PATH, RequestSettings, TOKEN_PATH, Transport};
use serde_json::{Value, json};

const BOOTSTRAP_PATH: &str = "/gdc/app/account/bootstrap";
const CURRENT_PROFILE_PATH: &str = "/gdc/account/profile/current";

#[derive(Debug, Clone, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Unexpected response shape, missing '{0}'")]
    UnexpectedPayload(&'static str),
}

/// Summary of the currently logged-in user, projected from the bootstrap
/// resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub login: String,
    pub login_md5: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_name: String,
    pub profile_uri: String,
}

#[derive(Debug, Clone)]
pub struct UserApi {
    xhr: Transport,
}

impl UserApi {
    pub fn new(xhr: Transport) -> Self {
        Self { xhr }
    }

    /// Authenticate against the platform. Every subsequent call in the
    /// current session is authenticated. Wrong credentials surface as
    /// [`ApiError::Unauthorized`].
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, UserError> {
        let payload = json!({
            "postUserLogin": {
                "login": username,
                "password": password,
                "remember": 1,
                "captcha": "",
                "verifyCaptcha": "",
            }
        });

        let response = self
            .xhr
            .post(LOGIN_PATH, RequestSettings::new().json_body(payload))
            .await?;
        Ok(response.data())
    }

    /// Log the current user out. Resolves with `None` when nobody was
    /// logged in to begin with.
    pub async fn logout(&self) -> Result<Option<ApiResponse>, UserError> {
        if !self.is_logged_in().await? {
            return Ok(None);
        }

        let bootstrap = self
            .xhr
            .get(BOOTSTRAP_PATH, RequestSettings::new())
            .await?
            .data();
        let profile_uri = string_at(
            &bootstrap,
            &["bootstrapResource", "accountSetting", "links", "self"],
            "bootstrapResource.accountSetting.links.self",
        )?;
        let user_id = profile_uri
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or(UserError::UnexpectedPayload(
                "bootstrapResource.accountSetting.links.self",
            ))?;

        let response = self
            .xhr
            .delete(&format!("{LOGIN_PATH}/{user_id}"), RequestSettings::new())
            .await?;
        Ok(Some(response))
    }

    /// Whether a user is currently logged in.
    pub async fn is_logged_in(&self) -> Result<bool, UserError> {
        match self.xhr.get(TOKEN_PATH, RequestSettings::new()).await {
            Ok(response) => Ok(response.ok()),
            Err(error) if error.is_unauthorized() => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    /// The current user's account setting object.
    pub async fn current_profile(&self) -> Result<Value, UserError> {
        let data = self
            .xhr
            .get(CURRENT_PROFILE_PATH, RequestSettings::new())
            .await?
            .data();
        data.get("accountSetting")
            .cloned()
            .ok_or(UserError::UnexpectedPayload("accountSetting"))
    }

    /// Info about the currently logged-in user from the bootstrap resource.
    pub async fn account_info(&self) -> Result<AccountInfo, UserError> {
        let bootstrap = self
            .xhr
            .get(BOOTSTRAP_PATH, RequestSettings::new())
            .await?
            .data();
        account_info_from_bootstrap(&bootstrap)
    }
}

fn account_info_from_bootstrap(bootstrap: &Value) -> Result<AccountInfo, UserError> {
    Ok(AccountInfo {
        login: string_at(
            bootstrap,
            &["bootstrapResource", "accountSetting", "login"],
            "bootstrapResource.accountSetting.login",
        )?,
        login_md5: string_at(
            bootstrap,
            &["bootstrapResource", "current", "loginMD5"],
            "bootstrapResource.current.loginMD5",
        )?,
        first_name: string_at(
            bootstrap,
            &["bootstrapResource", "accountSetting", "firstName"],
            "bootstrapResource.accountSetting.firstName",
        )?,
        last_name: string_at(
            bootstrap,
            &["bootstrapResource", "accountSetting", "lastName"],
            "bootstrapResource.accountSetting.lastName",
        )?,
        organization_name: string_at(
            bootstrap,
            &["bootstrapResource", "settings", "organizationName"],
            "bootstrapResource.settings.organizationName",
        )?,
        profile_uri: string_at(
            bootstrap,
            &["bootstrapResource", "accountSetting", "links", "self"],
            "bootstrapResource.accountSetting.links.self",
        )?,
    })
}

fn string_at(value: &Value, path: &[&str], label: &'static str) -> Result<String, UserError> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(UserError::UnexpectedPayload(label))
}

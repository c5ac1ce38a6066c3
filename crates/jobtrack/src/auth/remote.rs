//! Remote identity service client.
//!
//! Talks to a GoTrue-compatible auth API:
//! - `GET {url}/user` validates an access token
//! - `POST {url}/token?grant_type=refresh_token` rotates an expired session

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{
    AuthConfig, AuthError, ConfigValidationError, CredentialUpdate, Credentials,
    IdentityProvider, Resolution,
};

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: RemoteUser,
}

/// Identity provider backed by a remote auth service.
///
/// Requests carry no client-side timeout; the enclosing request's own
/// timeout bounds them.
#[derive(Debug, Clone)]
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cookie_name: String,
    refresh_cookie_name: String,
    refresh_token_ttl_secs: i64,
    secure: bool,
}

impl RemoteIdentityProvider {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigValidationError> {
        let base_url = config
            .remote_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigValidationError::MissingRemoteUrl)?
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.resolve_remote_api_key()?,
            cookie_name: config.cookie_name.clone(),
            refresh_cookie_name: config.refresh_cookie_name.clone(),
            refresh_token_ttl_secs: config.refresh_token_ttl_secs,
            secure: config.secure_cookies(),
        })
    }

    fn with_api_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key),
            None => request,
        }
    }

    /// Look up the user behind an access token; `None` if the token is rejected.
    async fn fetch_user(&self, access_token: &str) -> Result<Option<RemoteUser>, AuthError> {
        let request = self
            .client
            .get(format!("{}/user", self.base_url))
            .bearer_auth(access_token);

        let response = self
            .with_api_key(request)
            .send()
            .await
            .map_err(|e| AuthError::ResolutionFailed(format!("identity service unreachable: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                let user = response.json::<RemoteUser>().await.map_err(|e| {
                    AuthError::ResolutionFailed(format!("invalid user payload: {}", e))
                })?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(AuthError::ResolutionFailed(format!(
                "identity service returned {}",
                status
            ))),
        }
    }

    /// Exchange a refresh token; `None` if the refresh token is rejected.
    async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenGrant>, AuthError> {
        let request = self
            .client
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        let response = self
            .with_api_key(request)
            .send()
            .await
            .map_err(|e| AuthError::ResolutionFailed(format!("identity service unreachable: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                let grant = response.json::<TokenGrant>().await.map_err(|e| {
                    AuthError::ResolutionFailed(format!("invalid token grant: {}", e))
                })?;
                Ok(Some(grant))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Ok(None)
            }
            status => Err(AuthError::ResolutionFailed(format!(
                "identity service returned {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn resolve(&self, credentials: &Credentials) -> Result<Resolution, AuthError> {
        let access_token = credentials.cookie(&self.cookie_name);
        let refresh_token = credentials.cookie(&self.refresh_cookie_name);

        if let Some(access_token) = access_token
            && let Some(user) = self.fetch_user(access_token).await?
        {
            return Ok(Resolution::authenticated(user.id));
        }

        let Some(refresh_token) = refresh_token else {
            let mut resolution = Resolution::anonymous();
            if access_token.is_some() {
                resolution = resolution
                    .with_update(CredentialUpdate::clear(self.cookie_name.clone(), self.secure));
            }
            return Ok(resolution);
        };

        match self.refresh(refresh_token).await? {
            Some(grant) => {
                debug!("Rotated session for user {}", grant.user.id);
                Ok(Resolution::authenticated(grant.user.id)
                    .with_update(CredentialUpdate::set(
                        self.cookie_name.clone(),
                        grant.access_token,
                        grant.expires_in,
                        self.secure,
                    ))
                    .with_update(CredentialUpdate::set(
                        self.refresh_cookie_name.clone(),
                        grant.refresh_token,
                        self.refresh_token_ttl_secs,
                        self.secure,
                    )))
            }
            None => {
                warn!("Refresh token rejected by identity service, clearing session cookies");
                Ok(Resolution::anonymous()
                    .with_update(CredentialUpdate::clear(self.cookie_name.clone(), self.secure))
                    .with_update(CredentialUpdate::clear(
                        self.refresh_cookie_name.clone(),
                        self.secure,
                    )))
            }
        }
    }
}

//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Which identity provider resolves sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProviderKind {
    /// Locally signed HS256 session tokens.
    #[default]
    Jwt,
    /// Remote GoTrue-style identity service.
    Remote,
}

impl std::fmt::Display for IdentityProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityProviderKind::Jwt => write!(f, "jwt"),
            IdentityProviderKind::Remote => write!(f, "remote"),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity provider used to resolve sessions.
    pub provider: IdentityProviderKind,

    /// JWT secret for HS256 session tokens (`env:VAR_NAME` supported).
    /// REQUIRED for the `jwt` provider.
    pub jwt_secret: Option<String>,

    /// Cookie holding the session (access) token.
    pub cookie_name: String,

    /// Cookie holding the refresh token (`remote` provider).
    pub refresh_cookie_name: String,

    /// Lifetime of issued session tokens, in seconds.
    pub token_ttl_secs: i64,

    /// Session tokens with less remaining lifetime than this are reissued.
    pub refresh_window_secs: i64,

    /// Max-Age of the refresh token cookie, in seconds.
    pub refresh_token_ttl_secs: i64,

    /// Omit the `Secure` cookie flag (plain-http development only).
    pub insecure_cookies: bool,

    /// Base URL of the remote identity service, e.g. `https://id.example.com/auth/v1`.
    pub remote_url: Option<String>,

    /// API key sent to the remote identity service (`env:VAR_NAME` supported).
    pub remote_api_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: IdentityProviderKind::Jwt,
            // No default JWT secret - must be explicitly configured
            jwt_secret: None,
            cookie_name: "auth_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            token_ttl_secs: 60 * 60 * 24,
            refresh_window_secs: 60 * 60,
            refresh_token_ttl_secs: 60 * 60 * 24 * 30,
            insecure_cookies: false,
            remote_url: None,
            remote_api_key: None,
        }
    }
}

/// Expand `env:VAR_NAME` syntax in a secret value.
fn resolve_secret(value: Option<&String>) -> Result<Option<String>, ConfigValidationError> {
    match value {
        None => Ok(None),
        Some(value) => {
            if let Some(var_name) = value.strip_prefix("env:") {
                match std::env::var(var_name) {
                    Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                    Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                    Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                }
            } else {
                Ok(Some(value.clone()))
            }
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    /// Returns the resolved secret or None if not configured.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        resolve_secret(self.jwt_secret.as_ref())
    }

    /// Resolve the remote identity service API key, expanding `env:VAR_NAME` syntax.
    pub fn resolve_remote_api_key(&self) -> Result<Option<String>, ConfigValidationError> {
        resolve_secret(self.remote_api_key.as_ref())
    }

    /// Whether issued cookies carry the `Secure` flag.
    pub fn secure_cookies(&self) -> bool {
        !self.insecure_cookies
    }

    /// Validate the configuration for the selected provider.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.cookie_name.is_empty() || self.refresh_cookie_name.is_empty() {
            return Err(ConfigValidationError::EmptyCookieName);
        }

        match self.provider {
            IdentityProviderKind::Jwt => {
                let secret = self
                    .resolve_jwt_secret()?
                    .ok_or(ConfigValidationError::MissingJwtSecret)?;
                // Ensure minimum secret length for security
                if secret.len() < 32 {
                    return Err(ConfigValidationError::JwtSecretTooShort);
                }
                if self.refresh_window_secs >= self.token_ttl_secs {
                    return Err(ConfigValidationError::RefreshWindowTooLarge);
                }
            }
            IdentityProviderKind::Remote => {
                if self.remote_url.as_deref().is_none_or(str::is_empty) {
                    return Err(ConfigValidationError::MissingRemoteUrl);
                }
                self.resolve_remote_api_key()?;
            }
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// JWT secret is required for the `jwt` provider.
    MissingJwtSecret,
    /// JWT secret is too short (minimum 32 characters).
    JwtSecretTooShort,
    /// Refresh window must be shorter than the token lifetime.
    RefreshWindowTooLarge,
    /// Remote identity service URL is required for the `remote` provider.
    MissingRemoteUrl,
    /// Cookie names must not be empty.
    EmptyCookieName,
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => {
                write!(
                    f,
                    "JWT secret is required for the jwt provider. Set JOBTRACK__AUTH__JWT_SECRET or jwt_secret in config."
                )
            }
            Self::JwtSecretTooShort => {
                write!(
                    f,
                    "JWT secret must be at least 32 characters long for security."
                )
            }
            Self::RefreshWindowTooLarge => {
                write!(
                    f,
                    "refresh_window_secs must be smaller than token_ttl_secs."
                )
            }
            Self::MissingRemoteUrl => {
                write!(f, "remote_url is required for the remote provider.")
            }
            Self::EmptyCookieName => write!(f, "cookie names must not be empty."),
            Self::EnvVarNotFound(var) => {
                write!(
                    f,
                    "Environment variable '{}' not found (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::EnvVarEmpty(var) => {
                write!(
                    f,
                    "Environment variable '{}' is empty (referenced via env:{} in config).",
                    var, var
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

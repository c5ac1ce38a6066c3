//! Locally signed session tokens.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{debug, warn};
use std::sync::Arc;

use super::{
    AuthConfig, AuthError, Claims, ConfigValidationError, CredentialUpdate, Credentials,
    IdentityProvider, Resolution,
};

const ISSUER: &str = "jobtrack";

/// Identity provider validating HS256 session tokens held in a cookie.
///
/// Tokens close to expiry are reissued and sent back as a credential update.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    config: Arc<AuthConfig>,
    keys: Option<(EncodingKey, DecodingKey)>,
}

impl JwtIdentityProvider {
    /// Create a provider from config.
    ///
    /// Resolves `env:VAR_NAME` syntax in jwt_secret at construction time and
    /// fails if the variable is missing. An absent secret is accepted; every
    /// token then fails resolution.
    pub fn new(mut config: AuthConfig) -> Result<Self, ConfigValidationError> {
        config.jwt_secret = config.resolve_jwt_secret()?;

        let keys = config.jwt_secret.as_ref().map(|s| {
            (
                EncodingKey::from_secret(s.as_bytes()),
                DecodingKey::from_secret(s.as_bytes()),
            )
        });

        Ok(Self {
            config: Arc::new(config),
            keys,
        })
    }

    /// Issue a session token for a user, valid for `token_ttl_secs`.
    pub fn issue_token(&self, user_id: &str, email: Option<&str>) -> Result<String, AuthError> {
        let (encoding_key, _) = self
            .keys
            .as_ref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?;

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iss: Some(ISSUER.to_string()),
            exp: now + self.config.token_ttl_secs,
            iat: Some(now),
            email: email.map(str::to_string),
        };

        encode(&Header::default(), &claims, encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Credential update carrying a freshly issued session token.
    pub fn session_cookie(&self, token: String) -> CredentialUpdate {
        CredentialUpdate::set(
            self.config.cookie_name.clone(),
            token,
            self.config.token_ttl_secs,
            self.config.secure_cookies(),
        )
    }

    /// Validate a JWT token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let (_, decoding_key) = self
            .keys
            .as_ref()
            .ok_or_else(|| AuthError::ResolutionFailed("no JWT secret configured".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, credentials: &Credentials) -> Result<Resolution, AuthError> {
        let Some(token) = credentials.cookie(&self.config.cookie_name) else {
            return Ok(Resolution::anonymous());
        };

        let claims = match self.validate_token(token) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired) => {
                debug!("Session token expired, clearing cookie");
                return Ok(Resolution::anonymous().with_update(self.clear_cookie()));
            }
            Err(AuthError::InvalidToken(reason)) => {
                warn!("Rejecting invalid session token: {}", reason);
                return Ok(Resolution::anonymous().with_update(self.clear_cookie()));
            }
            Err(e) => return Err(e),
        };

        let mut resolution = Resolution::authenticated(claims.sub.clone());

        if claims.remaining_secs(Utc::now().timestamp()) < self.config.refresh_window_secs {
            debug!("Refreshing session token for user {}", claims.sub);
            let token = self.issue_token(&claims.sub, claims.email.as_deref())?;
            resolution = resolution.with_update(self.session_cookie(token));
        }

        Ok(resolution)
    }
}

impl JwtIdentityProvider {
    fn clear_cookie(&self) -> CredentialUpdate {
        CredentialUpdate::clear(self.config.cookie_name.clone(), self.config.secure_cookies())
    }
}

#[cfg(test)]
#[allow(clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    const SECRET: &str = "test-secret-for-unit-tests-minimum-32-chars-long";

    fn provider() -> JwtIdentityProvider {
        let mut config = AuthConfig::default();
        config.jwt_secret = Some(SECRET.to_string());
        JwtIdentityProvider::new(config).unwrap()
    }

    fn credentials(cookie: &str) -> Credentials {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        Credentials::from_headers(&headers)
    }

    fn token_expiring_in(secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "usr_1".to_string(),
            iss: Some(ISSUER.to_string()),
            exp: now + secs,
            iat: Some(now),
            email: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_cookie_is_anonymous() {
        let resolution = provider().resolve(&Credentials::default()).await.unwrap();
        assert_eq!(resolution, Resolution::anonymous());
    }

    #[tokio::test]
    async fn test_valid_token_is_authenticated_without_refresh() {
        let provider = provider();
        let token = provider.issue_token("usr_1", Some("a@example.com")).unwrap();

        let resolution = provider
            .resolve(&credentials(&format!("auth_token={}", token)))
            .await
            .unwrap();

        assert_eq!(resolution.session, Session::authenticated("usr_1"));
        assert!(resolution.updates.is_empty());
    }

    #[tokio::test]
    async fn test_token_near_expiry_is_refreshed() {
        let provider = provider();
        let token = token_expiring_in(60);

        let resolution = provider
            .resolve(&credentials(&format!("auth_token={}", token)))
            .await
            .unwrap();

        assert_eq!(resolution.session, Session::authenticated("usr_1"));
        assert_eq!(resolution.updates.len(), 1);
        let update = &resolution.updates[0];
        assert_eq!(update.name, "auth_token");
        assert_ne!(update.value, token);
        assert_eq!(update.max_age_secs, 60 * 60 * 24);

        let claims = provider.validate_token(&update.value).unwrap();
        assert_eq!(claims.sub, "usr_1");
    }

    #[tokio::test]
    async fn test_expired_token_is_anonymous_and_cleared() {
        let provider = provider();
        let token = token_expiring_in(-3600);

        let resolution = provider
            .resolve(&credentials(&format!("auth_token={}", token)))
            .await
            .unwrap();

        assert_eq!(resolution.session, Session::Anonymous);
        assert_eq!(resolution.updates.len(), 1);
        assert!(resolution.updates[0].is_removal());
    }

    #[tokio::test]
    async fn test_garbage_token_is_anonymous() {
        let resolution = provider()
            .resolve(&credentials("auth_token=not-a-jwt"))
            .await
            .unwrap();

        assert_eq!(resolution.session, Session::Anonymous);
        assert!(resolution.updates[0].is_removal());
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let mut config = AuthConfig::default();
        config.jwt_secret = Some("another-secret-that-is-also-32-chars-or-more".to_string());
        let foreign = JwtIdentityProvider::new(config)
            .unwrap()
            .issue_token("usr_1", None)
            .unwrap();

        let resolution = provider()
            .resolve(&credentials(&format!("auth_token={}", foreign)))
            .await
            .unwrap();
        assert_eq!(resolution.session, Session::Anonymous);
    }

    #[tokio::test]
    async fn test_missing_secret_fails_resolution() {
        let provider = JwtIdentityProvider::new(AuthConfig::default()).unwrap();

        let result = provider.resolve(&credentials("auth_token=abc")).await;
        assert!(matches!(result, Err(AuthError::ResolutionFailed(_))));

        // No credentials means nothing to validate.
        let resolution = provider.resolve(&Credentials::default()).await.unwrap();
        assert_eq!(resolution.session, Session::Anonymous);
    }

    #[test]
    fn test_unset_env_secret_is_rejected() {
        let mut config = AuthConfig::default();
        config.jwt_secret = Some("env:JOBTRACK_TEST_JWT_SECRET_NEVER_SET".to_string());

        let err = JwtIdentityProvider::new(config).err().unwrap();
        assert_eq!(
            err,
            ConfigValidationError::EnvVarNotFound("JOBTRACK_TEST_JWT_SECRET_NEVER_SET".to_string())
        );
    }
}

//! Session resolution.
//!
//! Resolves the caller's identity from request cookies with support for:
//! - Locally signed HS256 session tokens with sliding refresh
//! - A remote GoTrue-style identity service with refresh-token rotation

mod claims;
mod config;
mod credentials;
mod error;
mod jwt;
mod remote;
mod session;

use std::sync::Arc;

pub use claims::Claims;
pub use config::{AuthConfig, ConfigValidationError, IdentityProviderKind};
pub use credentials::{CredentialUpdate, Credentials, apply_to_cookie_header};
pub use error::AuthError;
pub use jwt::JwtIdentityProvider;
pub use remote::RemoteIdentityProvider;
pub use session::{IdentityProvider, Resolution, Session};

/// Build the identity provider selected in config.
pub fn build_identity_provider(
    config: &AuthConfig,
) -> Result<Arc<dyn IdentityProvider>, ConfigValidationError> {
    match config.provider {
        IdentityProviderKind::Jwt => Ok(Arc::new(JwtIdentityProvider::new(config.clone())?)),
        IdentityProviderKind::Remote => Ok(Arc::new(RemoteIdentityProvider::new(config)?)),
    }
}

//! Session resolution contract.

use async_trait::async_trait;
use serde::Serialize;

use super::{AuthError, CredentialUpdate, Credentials};

/// Caller identity derived from the request's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    Anonymous,
    Authenticated { user_id: String },
}

impl Session {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Session::Authenticated {
            user_id: user_id.into(),
        }
    }

    /// Get the user ID, if authenticated.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { user_id } => Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Anonymous => write!(f, "anonymous"),
            Session::Authenticated { user_id } => write!(f, "user {}", user_id),
        }
    }
}

/// Outcome of resolving a request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub session: Session,
    /// Credential cookies refreshed or cleared during resolution.
    pub updates: Vec<CredentialUpdate>,
}

impl Resolution {
    pub fn anonymous() -> Self {
        Self {
            session: Session::Anonymous,
            updates: Vec::new(),
        }
    }

    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            session: Session::authenticated(user_id),
            updates: Vec::new(),
        }
    }

    pub fn with_update(mut self, update: CredentialUpdate) -> Self {
        self.updates.push(update);
        self
    }
}

/// Resolves the caller's session from request credentials.
///
/// Missing, expired, or rejected credentials resolve to
/// [`Session::Anonymous`]. `Err(AuthError::ResolutionFailed)` is reserved for
/// an identity provider that could not be consulted at all.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, credentials: &Credentials) -> Result<Resolution, AuthError>;
}

//! Provisioning errors.

use thiserror::Error;

/// Error raised by a provisioning store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failure to load a user's provisioning state.
///
/// A missing profile row is not an error; it loads as a fresh state.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("fetching profile for user {user_id}: {source}")]
    Profile {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("fetching provider configuration for user {user_id}: {source}")]
    ProviderConfig {
        user_id: String,
        #[source]
        source: StoreError,
    },
}

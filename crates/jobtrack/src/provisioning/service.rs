//! Provisioning state loader.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::error::ProvisioningError;
use super::models::ProvisioningState;
use super::store::{
    ProfileStore, ProviderConfigStore, SqliteProfileStore, SqliteProviderConfigStore,
};

/// Loads a user's provisioning state from its two backing stores.
///
/// Both lookups are issued concurrently and awaited before returning. A
/// failed lookup is reported, never retried.
#[derive(Clone)]
pub struct ProvisioningLoader {
    profiles: Arc<dyn ProfileStore>,
    providers: Arc<dyn ProviderConfigStore>,
}

impl ProvisioningLoader {
    pub fn new(profiles: Arc<dyn ProfileStore>, providers: Arc<dyn ProviderConfigStore>) -> Self {
        Self {
            profiles,
            providers,
        }
    }

    /// Loader reading both tables from the same SQLite pool.
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::new(
            Arc::new(SqliteProfileStore::new(pool.clone())),
            Arc::new(SqliteProviderConfigStore::new(pool)),
        )
    }

    /// Load provisioning state for a user.
    ///
    /// If the user has no profile row, returns a fresh state.
    #[instrument(skip(self))]
    pub async fn load(&self, user_id: &str) -> Result<ProvisioningState, ProvisioningError> {
        let (profile, provider_config_id) = tokio::join!(
            self.profiles.fetch(user_id),
            self.providers.provider_config_id(user_id)
        );

        let profile = profile.map_err(|source| ProvisioningError::Profile {
            user_id: user_id.to_string(),
            source,
        })?;
        let provider_config_id =
            provider_config_id.map_err(|source| ProvisioningError::ProviderConfig {
                user_id: user_id.to_string(),
                source,
            })?;

        if profile.is_none() {
            debug!(
                "No profile for user {}, treating setup as not started",
                user_id
            );
        }

        Ok(ProvisioningState::from_parts(profile, provider_config_id))
    }
}

impl std::fmt::Debug for ProvisioningLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningLoader").finish_non_exhaustive()
    }
}

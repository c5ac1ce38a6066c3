//! Provisioning stores.
//!
//! Two independently owned lookups feed the provisioning state: the user's
//! profile row and the provider configuration table.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::error::StoreError;
use super::models::ProfileRecord;

/// Read access to user profile rows.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile row for a user, `None` if no row exists yet.
    async fn fetch(&self, user_id: &str) -> Result<Option<ProfileRecord>, StoreError>;
}

/// Read access to job provider configurations.
#[async_trait]
pub trait ProviderConfigStore: Send + Sync {
    /// Id of the user's first provider configuration, `None` if there is none.
    async fn provider_config_id(&self, user_id: &str) -> Result<Option<String>, StoreError>;
}

/// Profile store backed by the `profiles` table.
#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn fetch(&self, user_id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT
                setup_completed,
                backend_stage_completed_at IS NOT NULL AS backend_stage_completed,
                ai_stage_completed_at IS NOT NULL AS ai_stage_completed,
                CAST(default_document_id AS TEXT) AS default_document_id
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

/// Provider configuration store backed by the `provider_configs` table.
#[derive(Debug, Clone)]
pub struct SqliteProviderConfigStore {
    pool: SqlitePool,
}

impl SqliteProviderConfigStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderConfigStore for SqliteProviderConfigStore {
    async fn provider_config_id(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM provider_configs WHERE user_id = ? ORDER BY created_at, id LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| id))
    }
}

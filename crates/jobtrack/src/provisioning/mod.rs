//! Account provisioning state.
//!
//! This module loads how far a user has progressed through the post-signup
//! setup wizard:
//! - Stage ordering (backend, AI integration, document upload, providers)
//! - Profile and provider configuration lookups
//! - Absent profile rows treated as "nothing completed yet"

mod error;
mod models;
mod service;
mod store;

pub use error::{ProvisioningError, StoreError};
pub use models::*;
pub use service::ProvisioningLoader;
pub use store::{
    ProfileStore, ProviderConfigStore, SqliteProfileStore, SqliteProviderConfigStore,
};

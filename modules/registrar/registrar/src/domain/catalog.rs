//! Ports to the catalog agents.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::CatalogError;
use crate::domain::model::ServiceRegistration;

/// Connection to one catalog agent.
///
/// Every method is a single round trip; nothing is retried.
#[async_trait]
pub trait CatalogAgent: Send + Sync {
    async fn register_service(&self, registration: &ServiceRegistration)
    -> Result<(), CatalogError>;

    async fn deregister_service(&self, service_id: &str) -> Result<(), CatalogError>;

    /// Store `value` under `key` only if the key does not exist yet.
    ///
    /// Returns `false` when the key was already present; the stored value is
    /// left untouched in that case.
    async fn kv_create(&self, key: &str, value: &[u8]) -> Result<bool, CatalogError>;

    async fn kv_delete(&self, key: &str) -> Result<(), CatalogError>;
}

/// Factory for agent connections, one call per previously unseen address.
pub trait AgentConnector: Send + Sync {
    /// # Errors
    ///
    /// Returns `CatalogError::Connect` when no client can be built for the
    /// address (bad TLS material, invalid address).
    fn connect(&self, address: &str) -> Result<Arc<dyn CatalogAgent>, CatalogError>;
}

//! Backend records under `upstreams/`, consumed by the load balancer.
//!
//! One record per (service name, agent, port): task instances sharing an agent
//! and port collapse to a single backend.

use crate::domain::cache::CacheEntry;
use crate::domain::catalog::CatalogAgent;
use crate::domain::error::{CatalogError, RegistrarError};
use crate::domain::model::BackendRecord;

pub const UPSTREAMS_PREFIX: &str = "upstreams";

#[must_use]
pub fn upstream_key(name: &str, agent: &str, port: u16) -> String {
    format!("{UPSTREAMS_PREFIX}/{name}/{agent}:{port}")
}

/// Agent name embedded in a composite registration id.
///
/// Takes the second `:`-separated segment and drops everything from its first
/// `-`: `web-1:agentA-3` yields `agentA`. `None` when the id has no such
/// segment.
#[must_use]
pub fn agent_from_registration_id(id: &str) -> Option<&str> {
    let segment = id.split(':').nth(1)?;
    let agent = segment.split_once('-').map_or(segment, |(agent, _)| agent);
    (!agent.is_empty()).then_some(agent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    AlreadyPresent,
}

#[derive(Debug, Clone, Default)]
pub struct UpstreamStore {
    record: BackendRecord,
}

impl UpstreamStore {
    #[must_use]
    pub fn new(record: BackendRecord) -> Self {
        Self { record }
    }

    /// Create the record for (`name`, `agent`, `port`) unless it exists.
    ///
    /// An existing record is left as is and reported as
    /// [`UpsertOutcome::AlreadyPresent`].
    ///
    /// # Errors
    ///
    /// `RegistrarError::UpstreamWrite` when the CAS round trip fails.
    pub async fn upsert(
        &self,
        catalog: &dyn CatalogAgent,
        name: &str,
        agent: &str,
        port: u16,
    ) -> Result<UpsertOutcome, RegistrarError> {
        let key = upstream_key(name, agent, port);

        let written = match serde_json::to_vec(&self.record) {
            Ok(value) => catalog.kv_create(&key, &value).await,
            Err(e) => Err(CatalogError::from(e)),
        };

        match written {
            Ok(true) => Ok(UpsertOutcome::Created),
            Ok(false) => {
                tracing::debug!(key = %key, "backend record already present");
                Ok(UpsertOutcome::AlreadyPresent)
            }
            Err(source) => Err(RegistrarError::UpstreamWrite { key, source }),
        }
    }

    /// Delete the record belonging to a tracked registration.
    ///
    /// The agent part of the key comes from the registration id; ids without
    /// an embedded agent fall back to the agent stored in the entry.
    ///
    /// # Errors
    ///
    /// `RegistrarError::UpstreamDelete` when the delete round trip fails.
    pub async fn remove(
        &self,
        catalog: &dyn CatalogAgent,
        entry: &CacheEntry,
    ) -> Result<(), RegistrarError> {
        let registration = &entry.registration;
        let agent = agent_from_registration_id(&registration.id).unwrap_or(&entry.agent);
        let key = upstream_key(&registration.name, agent, registration.port);

        catalog
            .kv_delete(&key)
            .await
            .map_err(|source| RegistrarError::UpstreamDelete { key, source })
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::catalog::{AgentConnector, CatalogAgent};
use crate::domain::error::RegistrarError;

/// Lazily built catalog connections, at most one per agent address.
///
/// Connections are never evicted; an agent that goes away shows up as request
/// errors on the next use.
pub struct AgentPool {
    connector: Arc<dyn AgentConnector>,
    agents: HashMap<String, Arc<dyn CatalogAgent>>,
}

impl AgentPool {
    #[must_use]
    pub fn new(connector: Arc<dyn AgentConnector>) -> Self {
        Self {
            connector,
            agents: HashMap::new(),
        }
    }

    /// Connection for `address`, created on first use.
    ///
    /// # Errors
    ///
    /// - `RegistrarError::EmptyAgentAddress` (recoverable) for an empty address
    /// - `RegistrarError::Connect` (fatal) when the connection cannot be built
    pub fn client(&mut self, address: &str) -> Result<Arc<dyn CatalogAgent>, RegistrarError> {
        if address.is_empty() {
            tracing::warn!("no catalog agent address given");
            return Err(RegistrarError::EmptyAgentAddress);
        }

        if let Some(agent) = self.agents.get(address) {
            return Ok(Arc::clone(agent));
        }

        let agent = self.connector.connect(address).map_err(|source| {
            tracing::error!(agent = address, error = %source, "cannot connect to catalog agent");
            RegistrarError::Connect {
                address: address.to_owned(),
                source,
            }
        })?;
        tracing::debug!(agent = address, "catalog agent connection created");

        self.agents.insert(address.to_owned(), Arc::clone(&agent));
        Ok(agent)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

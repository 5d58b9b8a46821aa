//! Desired services read from a JSON file.
//!
//! The file holds an array of services and is re-read on every pass, so an
//! external writer can update it while the loop runs:
//!
//! ```json
//! [
//!   {
//!     "id": "web-1:agent1-80",
//!     "name": "web",
//!     "agent": "agent1",
//!     "port": 80,
//!     "address": "10.0.0.5",
//!     "tags": ["blue"],
//!     "check": {"type": "http", "http": "http://10.0.0.5/health", "interval": "10s"}
//!   }
//! ]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use registrar_sdk::{Service, ServiceSource, SourceError};

#[derive(Debug, Clone)]
pub struct FileServiceSource {
    path: PathBuf,
}

impl FileServiceSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl ServiceSource for FileServiceSource {
    async fn desired_services(&self) -> Result<Vec<Service>, SourceError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Read {
                location: self.location(),
                source,
            })?;

        let services: Vec<Service> =
            serde_json::from_slice(&raw).map_err(|e| SourceError::invalid(self.location(), e))?;

        let mut seen = HashSet::with_capacity(services.len());
        for service in &services {
            if service.id.is_empty() {
                return Err(SourceError::invalid(
                    self.location(),
                    format!("service `{}` has an empty id", service.name),
                ));
            }
            if !seen.insert(service.id.as_str()) {
                return Err(SourceError::invalid(
                    self.location(),
                    format!("duplicate service id `{}`", service.id),
                ));
            }
        }

        tracing::debug!(path = %self.path.display(), count = services.len(), "desired services loaded");
        Ok(services)
    }
}

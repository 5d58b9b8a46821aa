//! Desired-state model produced by service sources.

use serde::{Deserialize, Serialize};

/// One live orchestrator task that should be discoverable in the catalog.
///
/// A fresh value is produced on every reconciliation pass, even for tasks that
/// did not change. `id` is unique per task instance; many instances share a
/// `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Address of the catalog agent the task is registered with.
    pub agent: String,
    pub port: u16,
    pub address: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub check: HealthCheck,
}

/// Health check attached to a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(flatten)]
    pub kind: CheckKind,
    /// Probe interval in the catalog's duration syntax, e.g. `10s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckKind {
    /// The task must report in within `ttl`.
    Ttl { ttl: String },
    /// The agent runs `script` every interval.
    Script { script: String },
    /// The agent issues a GET against `http` every interval.
    Http { http: String },
}

impl HealthCheck {
    #[must_use]
    pub fn ttl(ttl: impl Into<String>) -> Self {
        Self {
            kind: CheckKind::Ttl { ttl: ttl.into() },
            interval: None,
        }
    }

    #[must_use]
    pub fn script(script: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            kind: CheckKind::Script {
                script: script.into(),
            },
            interval: Some(interval.into()),
        }
    }

    #[must_use]
    pub fn http(url: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            kind: CheckKind::Http { http: url.into() },
            interval: Some(interval.into()),
        }
    }
}

use registrar_sdk::{CheckKind, HealthCheck, Service};
use serde::Serialize;

/// Payload of `PUT /v1/agent/service/register`.
///
/// Kept in the registration cache as the record of what was actually sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRegistration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub port: u16,
    pub address: String,
    pub check: AgentServiceCheck,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentServiceCheck {
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(rename = "HTTP", skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

impl From<&HealthCheck> for AgentServiceCheck {
    fn from(check: &HealthCheck) -> Self {
        let mut out = Self {
            interval: check.interval.clone(),
            ..Self::default()
        };
        match &check.kind {
            CheckKind::Ttl { ttl } => out.ttl = Some(ttl.clone()),
            CheckKind::Script { script } => out.script = Some(script.clone()),
            CheckKind::Http { http } => out.http = Some(http.clone()),
        }
        out
    }
}

impl From<&Service> for ServiceRegistration {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.clone(),
            name: service.name.clone(),
            tags: service.tags.clone(),
            port: service.port,
            address: service.address.clone(),
            check: AgentServiceCheck::from(&service.check),
        }
    }
}

/// Load balancer backend parameters stored under `upstreams/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendRecord {
    pub weight: u32,
    pub max_fails: u32,
    pub fail_timeout: u32,
}

impl Default for BackendRecord {
    fn default() -> Self {
        Self {
            weight: 1,
            max_fails: 2,
            fail_timeout: 10,
        }
    }
}

//! Error types for catalog access and reconciliation.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single catalog agent operation.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A client for the agent could not be constructed.
    #[error("cannot build catalog client for {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The round trip failed (transport, timeout, non-2xx status).
    #[error("{operation} failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The agent answered 2xx with a body we do not understand.
    #[error("{operation} returned an unexpected response: {detail}")]
    UnexpectedResponse {
        operation: &'static str,
        detail: String,
    },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CatalogError {
    #[must_use]
    pub fn request(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Request {
            operation,
            source: source.into(),
        }
    }
}

/// How far an error is allowed to travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Affects one service; logged and retried on the next pass.
    Recoverable,
    /// No catalog access; the reconciliation loop stops.
    Fatal,
}

#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("no catalog agent address given")]
    EmptyAgentAddress,

    #[error("cannot connect to catalog agent {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: CatalogError,
    },

    #[error("unable to register {service_id}: {source}")]
    Register {
        service_id: String,
        #[source]
        source: CatalogError,
    },

    #[error("unable to deregister {service_id}: {source}")]
    Deregister {
        service_id: String,
        #[source]
        source: CatalogError,
    },

    #[error("unable to CAS key {key}: {source}")]
    UpstreamWrite {
        key: String,
        #[source]
        source: CatalogError,
    },

    #[error("unable to delete key {key}: {source}")]
    UpstreamDelete {
        key: String,
        #[source]
        source: CatalogError,
    },
}

impl RegistrarError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Connect { .. } => Severity::Fatal,
            Self::EmptyAgentAddress
            | Self::Register { .. }
            | Self::Deregister { .. }
            | Self::UpstreamWrite { .. }
            | Self::UpstreamDelete { .. } => Severity::Recoverable,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

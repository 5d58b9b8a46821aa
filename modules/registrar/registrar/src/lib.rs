#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Registrar
//!
//! Keeps a service catalog in step with the orchestrator's live tasks. Every
//! pass registers the desired services that are not tracked yet, marks the ones
//! that are, and sweeps tracked services that were not seen: they are
//! deregistered from the catalog and their `upstreams/` records are deleted.
//!
//! The desired-service contract lives in `registrar-sdk` and is re-exported here.

pub use registrar_sdk::{CheckKind, HealthCheck, Service, ServiceSource, SourceError};

pub mod config;
pub mod domain;
pub mod infra;

pub use config::{BasicAuthConfig, CatalogConfig, ReconcileConfig, SourceConfig, TlsConfig};
pub use domain::catalog::{AgentConnector, CatalogAgent};
pub use domain::error::{CatalogError, RegistrarError, Severity};
pub use domain::service::{PassReport, Reconciler, RegisterOutcome, SweepReport};
pub use infra::consul::{ConsulAgent, ConsulConnector};
pub use infra::file_source::FileServiceSource;

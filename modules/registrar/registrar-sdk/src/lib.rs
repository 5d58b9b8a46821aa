#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Registrar SDK
//!
//! Public contract of the `registrar` module:
//! - [`Service`] and [`HealthCheck`], the desired state of one orchestrator task
//! - [`ServiceSource`], the seam through which the reconciler learns the desired set
//! - [`SourceError`] for source failures
//!
//! ```ignore
//! use registrar_sdk::ServiceSource;
//!
//! let desired = source.desired_services().await?;
//! for service in &desired {
//!     reconciler.register(service).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

pub use api::ServiceSource;
pub use error::SourceError;
pub use models::{CheckKind, HealthCheck, Service};

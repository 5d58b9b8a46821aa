//! `ServiceSource` trait definition.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::Service;

/// Producer of the desired service set.
///
/// Called once per reconciliation pass. Every call returns the complete set of
/// services that should be registered right now; services missing from the
/// result are deregistered at the end of the pass.
#[async_trait]
pub trait ServiceSource: Send + Sync {
    /// Return every currently-live service.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` when the desired set cannot be determined. The
    /// pass is skipped in that case; nothing is deregistered.
    async fn desired_services(&self) -> Result<Vec<Service>, SourceError>;
}

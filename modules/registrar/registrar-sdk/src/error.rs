//! Service source errors.

use thiserror::Error;

/// Failure to produce the desired service set.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The backing store could not be read.
    #[error("failed to read services from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing store was read but its content is not a service list.
    #[error("invalid service list in {location}: {reason}")]
    Invalid { location: String, reason: String },

    /// Source-specific failure.
    #[error("service source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    #[must_use]
    pub fn invalid(location: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Invalid {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

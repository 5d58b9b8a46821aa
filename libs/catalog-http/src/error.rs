use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a request to a catalog agent
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("failed to build request: {0}")]
    Build(#[from] http::Error),

    /// The target is not an absolute `http(s)://host[:port]/...` URL
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    /// Plain HTTP target on a client built for TLS only
    #[error("refusing plain HTTP to '{url}': client requires TLS")]
    InsecureScheme { url: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, reset, DNS failure and the like
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] BoxError),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Non-2xx answer; `body` holds the start of the response body
    #[error("HTTP {status}: {body}")]
    Status {
        status: http::StatusCode,
        body: String,
    },

    #[error("JSON processing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl HttpError {
    /// Status code of an [`HttpError::Status`] error
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the agent never answered (transport failure or timeout)
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl From<http::header::InvalidHeaderName> for HttpError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for HttpError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

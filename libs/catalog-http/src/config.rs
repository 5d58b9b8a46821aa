use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("catalog-http/", env!("CARGO_PKG_VERSION"));

/// Bytes of a non-2xx body kept in [`HttpError::Status`](crate::HttpError::Status).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Which URL schemes a client may talk to
///
/// Agents usually listen on plain HTTP inside a private network, so
/// `AllowInsecureHttp` is a normal production setting here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    #[default]
    TlsOnly,
    AllowInsecureHttp,
}

/// How the agent's certificate is checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CertificateVerification {
    /// Chain and host name checked against the OS trust store, or the Mozilla
    /// roots when the OS store is empty
    #[default]
    Verify,
    /// Any certificate is accepted; handshake signatures are still checked.
    /// For agents with self-signed certificates.
    AcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Deadline for sending a request and receiving the response head
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Cap on any response body read
    pub max_body_size: usize,
    pub transport: TransportSecurity,
    pub certificate_verification: CertificateVerification,
    /// `None` keeps idle pooled connections open forever
    pub pool_idle_timeout: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_body_size: 1024 * 1024,
            transport: TransportSecurity::TlsOnly,
            certificate_verification: CertificateVerification::Verify,
            pool_idle_timeout: Some(Duration::from_secs(90)),
        }
    }
}

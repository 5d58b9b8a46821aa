use crate::client::HttpClient;
use crate::config::{CertificateVerification, HttpClientConfig, TransportSecurity};
use crate::error::HttpError;
use crate::tls;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{AUTHORIZATION, HeaderName, HeaderValue, USER_AGENT};
use http_body_util::Full;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use std::time::Duration;

/// Builder for an [`HttpClient`]
#[derive(Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    default_headers: Vec<(String, String)>,
    basic_auth: Option<(String, String)>,
}

impl HttpClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Skip chain and host name validation of the agent certificate
    #[must_use]
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.certificate_verification = if accept {
            CertificateVerification::AcceptInvalid
        } else {
            CertificateVerification::Verify
        };
        self
    }

    /// Header sent with every request, e.g. an ACL token.
    ///
    /// The value is marked sensitive. A request-level header of the same name
    /// wins.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// `Authorization: Basic ...` on every request
    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// # Errors
    /// `HttpError::InvalidHeader` for a bad default header, `HttpError::Tls`
    /// when the TLS configuration cannot be assembled.
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let default_headers = self.header_list()?;
        let connector = https_connector(&self.config)?;

        let inner = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(self.config.pool_idle_timeout)
            .build::<_, Full<Bytes>>(connector);

        Ok(HttpClient {
            inner,
            default_headers: Arc::from(default_headers),
            request_timeout: self.config.request_timeout,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
        })
    }

    fn header_list(&self) -> Result<Vec<(HeaderName, HeaderValue)>, HttpError> {
        let mut headers = vec![(USER_AGENT, HeaderValue::try_from(&self.config.user_agent)?)];

        if let Some((username, password)) = &self.basic_auth {
            let credentials = STANDARD.encode(format!("{username}:{password}"));
            headers.push((AUTHORIZATION, sensitive(&format!("Basic {credentials}"))?));
        }
        for (name, value) in &self.default_headers {
            headers.push((HeaderName::try_from(name.as_str())?, sensitive(value)?));
        }

        Ok(headers)
    }
}

fn sensitive(value: &str) -> Result<HeaderValue, HttpError> {
    let mut value = HeaderValue::try_from(value)?;
    value.set_sensitive(true);
    Ok(value)
}

fn https_connector(config: &HttpClientConfig) -> Result<HttpsConnector<HttpConnector>, HttpError> {
    let tls_error = |e: rustls::Error| HttpError::Tls(Box::new(e));
    let builder = hyper_rustls::HttpsConnectorBuilder::new();

    let builder = match config.certificate_verification {
        CertificateVerification::AcceptInvalid => {
            tracing::warn!("agent certificate verification disabled");
            builder.with_tls_config(tls::accept_invalid_certs_client_config().map_err(tls_error)?)
        }
        CertificateVerification::Verify => match tls::native_roots_client_config().map_err(tls_error)? {
            Some(client_config) => builder.with_tls_config(client_config),
            None => builder
                .with_provider_and_webpki_roots(tls::crypto_provider())
                .map_err(tls_error)?,
        },
    };

    let connector = match config.transport {
        TransportSecurity::AllowInsecureHttp => builder.https_or_http().enable_all_versions().build(),
        TransportSecurity::TlsOnly => builder.https_only().enable_all_versions().build(),
    };
    Ok(connector)
}

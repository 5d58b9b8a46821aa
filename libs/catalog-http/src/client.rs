use crate::builder::HttpClientBuilder;
use crate::config::TransportSecurity;
use crate::request::RequestBuilder;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type InnerClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Pooled HTTP client
///
/// `HttpClient` is `Clone + Send + Sync`; clones share the connection pool and
/// the default headers.
///
/// # Example
///
/// ```ignore
/// let client = HttpClient::builder()
///     .transport(TransportSecurity::AllowInsecureHttp)
///     .build()?;
///
/// client
///     .put("http://127.0.0.1:8500/v1/agent/service/deregister/web-1")
///     .send()
///     .await?
///     .checked_bytes()
///     .await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) inner: InnerClient,
    pub(crate) default_headers: Arc<[(HeaderName, HeaderValue)]>,
    pub(crate) request_timeout: Duration,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("default_headers", &self.default_headers.len())
            .field("request_timeout", &self.request_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("transport_security", &self.transport_security)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Start a GET request
    ///
    /// The URL must be absolute (scheme and host). Plain `http://` URLs are
    /// only accepted with [`TransportSecurity::AllowInsecureHttp`].
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::GET, url)
    }

    /// Start a PUT request
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::PUT, url)
    }

    /// Start a DELETE request
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(http::Method::DELETE, url)
    }

    fn request(&self, method: http::Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, url.to_owned())
    }
}

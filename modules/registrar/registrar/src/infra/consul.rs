//! Consul agent HTTP API adapter.

use std::sync::Arc;

use async_trait::async_trait;
use catalog_http::{HttpClient, HttpError, TransportSecurity};
use secrecy::ExposeSecret;
use url::Url;

use crate::config::CatalogConfig;
use crate::domain::catalog::{AgentConnector, CatalogAgent};
use crate::domain::error::CatalogError;
use crate::domain::model::ServiceRegistration;

pub const TOKEN_HEADER: &str = "x-consul-token";

/// Builds a [`ConsulAgent`] per address from the shared catalog settings.
#[derive(Debug)]
pub struct ConsulConnector {
    config: CatalogConfig,
}

impl ConsulConnector {
    #[must_use]
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }
}

impl AgentConnector for ConsulConnector {
    fn connect(&self, address: &str) -> Result<Arc<dyn CatalogAgent>, CatalogError> {
        let agent = ConsulAgent::new(address, &self.config)?;
        Ok(Arc::new(agent))
    }
}

/// Client for one agent at `<scheme>://<address>:<port>`.
#[derive(Debug, Clone)]
pub struct ConsulAgent {
    base_url: Url,
    http: HttpClient,
}

impl ConsulAgent {
    /// # Errors
    ///
    /// `CatalogError::Connect` when the address does not form a valid URL or
    /// the HTTP client cannot be built.
    pub fn new(address: &str, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let connect_error = |reason: String| CatalogError::Connect {
            address: address.to_owned(),
            reason,
        };

        let scheme = if config.tls.enabled { "https" } else { "http" };
        let base_url = Url::parse(&format!("{scheme}://{address}:{}", config.port))
            .map_err(|e| connect_error(e.to_string()))?;
        tracing::debug!(agent = address, url = %base_url, "catalog agent address");

        let transport = if config.tls.enabled {
            TransportSecurity::TlsOnly
        } else {
            TransportSecurity::AllowInsecureHttp
        };
        let skip_verify = config.tls.enabled && !config.tls.verify;
        if skip_verify {
            tracing::debug!(agent = address, "agent certificate verification disabled");
        }

        let mut builder = HttpClient::builder()
            .timeout(config.request_timeout)
            .transport(transport)
            .danger_accept_invalid_certs(skip_verify);

        if let Some(token) = &config.token {
            tracing::debug!(agent = address, "sending ACL token");
            builder = builder.default_header(TOKEN_HEADER, token.expose_secret());
        }
        if let Some(auth) = &config.auth {
            tracing::debug!(agent = address, username = %auth.username, "using basic auth");
            builder = builder.basic_auth(auth.username.as_str(), auth.password.expose_secret());
        }

        let http = builder.build().map_err(|e| connect_error(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // http(s) URLs always have a path, so this cannot fail
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn kv_url(&self, key: &str) -> Url {
        self.endpoint(["v1", "kv"].into_iter().chain(key.split('/')))
    }
}

fn failed(operation: &'static str) -> impl FnOnce(HttpError) -> CatalogError {
    move |e| CatalogError::request(operation, e)
}

#[async_trait]
impl CatalogAgent for ConsulAgent {
    async fn register_service(
        &self,
        registration: &ServiceRegistration,
    ) -> Result<(), CatalogError> {
        const OP: &str = "register service";
        let url = self.endpoint(["v1", "agent", "service", "register"]);

        self.http
            .put(url.as_str())
            .json(registration)
            .map_err(failed(OP))?
            .send()
            .await
            .map_err(failed(OP))?
            .checked_bytes()
            .await
            .map_err(failed(OP))?;
        Ok(())
    }

    async fn deregister_service(&self, service_id: &str) -> Result<(), CatalogError> {
        const OP: &str = "deregister service";
        let url = self.endpoint(["v1", "agent", "service", "deregister", service_id]);

        self.http
            .put(url.as_str())
            .send()
            .await
            .map_err(failed(OP))?
            .checked_bytes()
            .await
            .map_err(failed(OP))?;
        Ok(())
    }

    async fn kv_create(&self, key: &str, value: &[u8]) -> Result<bool, CatalogError> {
        const OP: &str = "create key";
        let mut url = self.kv_url(key);
        url.query_pairs_mut().append_pair("cas", "0");

        let body = self
            .http
            .put(url.as_str())
            .body_bytes(value.to_vec())
            .send()
            .await
            .map_err(failed(OP))?
            .text()
            .await
            .map_err(failed(OP))?;

        match body.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(CatalogError::UnexpectedResponse {
                operation: OP,
                detail: format!("expected `true` or `false`, got `{other}`"),
            }),
        }
    }

    async fn kv_delete(&self, key: &str) -> Result<(), CatalogError> {
        const OP: &str = "delete key";
        let url = self.kv_url(key);

        self.http
            .delete(url.as_str())
            .send()
            .await
            .map_err(failed(OP))?
            .checked_bytes()
            .await
            .map_err(failed(OP))?;
        Ok(())
    }
}

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP client for catalog agent APIs
//!
//! This crate provides a hyper-based HTTP client with:
//! - TLS via rustls (aws-lc-rs provider), OS roots with a bundled fallback
//! - Optional acceptance of invalid server certificates (self-signed agent certs)
//! - Connection pooling, one client per agent address
//! - Per-request timeouts
//! - Default headers applied to every request (access token, basic auth)
//! - Bounded response body reads
//!
//! There is no retry layer: every call is a single round trip and callers
//! decide when to try again.
//!
//! # Example
//!
//! ```ignore
//! use catalog_http::{HttpClient, TransportSecurity};
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(5))
//!     .transport(TransportSecurity::AllowInsecureHttp)
//!     .default_header("x-consul-token", "secret")
//!     .build()?;
//!
//! let applied: bool = client
//!     .put("http://10.0.0.7:8500/v1/kv/upstreams/web/10.0.0.7:80?cas=0")
//!     .body_bytes(value)
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    CertificateVerification, DEFAULT_USER_AGENT, ERROR_BODY_PREVIEW_LIMIT, HttpClientConfig,
    TransportSecurity,
};
pub use error::HttpError;
pub use request::RequestBuilder;
pub use response::HttpResponse;

use crate::client::HttpClient;
use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::response::HttpResponse;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Method, Request, Uri};
use http_body_util::Full;
use serde::Serialize;

/// A request under construction
///
/// Created by [`HttpClient::get`], [`HttpClient::put`] and
/// [`HttpClient::delete`]. An invalid header is remembered and reported by
/// [`send()`](RequestBuilder::send).
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    client: HttpClient,
    method: Method,
    url: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    content_type: Option<&'static str>,
    deferred: Option<HttpError>,
}

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: Vec::new(),
            body: Bytes::new(),
            content_type: None,
            deferred: None,
        }
    }

    /// Add a header, replacing a client default of the same name
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.deferred.is_none() {
            match parse_header(name, value) {
                Ok(header) => self.headers.push(header),
                Err(e) => self.deferred = Some(e),
            }
        }
        self
    }

    /// Serialize `body` as the JSON payload
    ///
    /// # Errors
    ///
    /// `HttpError::Json` when serialization fails, or a header error recorded
    /// earlier.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        self.body = Bytes::from(serde_json::to_vec(body)?);
        self.content_type = Some("application/json");
        Ok(self)
    }

    /// Send `body` as is, without a content type
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.content_type = None;
        self
    }

    /// Perform the round trip
    ///
    /// Any HTTP status is `Ok`; the checked readers on [`HttpResponse`] turn
    /// non-2xx answers into errors.
    ///
    /// # Errors
    ///
    /// Invalid header or URL, a plain HTTP URL on a TLS-only client, a
    /// transport failure, or the request timeout.
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.deferred {
            return Err(e);
        }
        let uri = parse_target(&self.url, self.client.transport_security)?;

        let mut request = Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Full::new(self.body))?;

        let headers = request.headers_mut();
        for (name, value) in self.client.default_headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(content_type) = self.content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        for (name, value) in self.headers {
            headers.insert(name, value);
        }

        let timeout = self.client.request_timeout;
        let response = tokio::time::timeout(timeout, self.client.inner.request(request))
            .await
            .map_err(|_elapsed| HttpError::Timeout(timeout))??;

        Ok(HttpResponse::new(response, self.client.max_body_size))
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HttpError> {
    Ok((HeaderName::try_from(name)?, HeaderValue::try_from(value)?))
}

/// Absolute URL whose scheme the transport mode permits.
fn parse_target(url: &str, transport: TransportSecurity) -> Result<Uri, HttpError> {
    let invalid = |reason| HttpError::InvalidUrl {
        url: url.to_owned(),
        reason,
    };

    let uri: Uri = url.parse().map_err(|_| invalid("malformed"))?;
    if uri.authority().is_none() {
        return Err(invalid("missing host"));
    }

    match (uri.scheme_str(), transport) {
        (Some("https"), _) | (Some("http"), TransportSecurity::AllowInsecureHttp) => Ok(uri),
        (Some("http"), TransportSecurity::TlsOnly) => Err(HttpError::InsecureScheme {
            url: url.to_owned(),
        }),
        (Some(_), _) => Err(invalid("scheme must be http or https")),
        (None, _) => Err(invalid("missing scheme")),
    }
}

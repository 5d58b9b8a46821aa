use crate::config::ERROR_BODY_PREVIEW_LIMIT;
use crate::error::HttpError;
use bytes::{Bytes, BytesMut};
use http::{Response, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::de::DeserializeOwned;

/// Agent response; every body read is capped at the client's `max_body_size`
#[derive(Debug)]
pub struct HttpResponse {
    inner: Response<Incoming>,
    max_body_size: usize,
}

impl HttpResponse {
    pub(crate) fn new(inner: Response<Incoming>, max_body_size: usize) -> Self {
        Self {
            inner,
            max_body_size,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Body without looking at the status
    ///
    /// # Errors
    /// `HttpError::BodyTooLarge` over the limit, `HttpError::Transport` when
    /// the body stream breaks.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        collect(self.inner, self.max_body_size).await
    }

    /// Body of a 2xx response
    ///
    /// # Errors
    /// `HttpError::Status` carrying the start of the body for non-2xx, plus
    /// the errors of [`HttpResponse::bytes`].
    pub async fn checked_bytes(self) -> Result<Bytes, HttpError> {
        let status = self.inner.status();
        if status.is_success() {
            return self.bytes().await;
        }

        let limit = self.max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);
        let body = match collect(self.inner, limit).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(HttpError::BodyTooLarge { .. }) => "<body too large for preview>".to_owned(),
            Err(e) => return Err(e),
        };
        Err(HttpError::Status { status, body })
    }

    /// Lossy UTF-8 body of a 2xx response
    ///
    /// # Errors
    /// See [`HttpResponse::checked_bytes`].
    pub async fn text(self) -> Result<String, HttpError> {
        let bytes = self.checked_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// JSON body of a 2xx response
    ///
    /// # Errors
    /// `HttpError::Json` on malformed JSON, plus the errors of
    /// [`HttpResponse::checked_bytes`].
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let bytes = self.checked_bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn collect(response: Response<Incoming>, limit: usize) -> Result<Bytes, HttpError> {
    let mut body = response.into_body();
    let mut collected = BytesMut::new();

    while let Some(frame) = body.frame().await {
        if let Some(chunk) = frame?.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge { limit });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(collected.freeze())
}

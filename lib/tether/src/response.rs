//! Outcome of sending a [`Request`](crate::Request).
//!
//! A [`Response`] always comes back from `send`, even when something failed:
//! it carries the error next to whatever was obtained, so callers can still
//! look at the request that was attempted. Check [`Response::error`] (or use
//! one of the decoders, which return it first) before trusting any field.

use std::path::Path;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tether_core::{Error, HttpRequest, HttpResponse, Result};
use tokio::io::AsyncWriteExt;

/// Outcome of one send: raw response, error, attempted request.
#[derive(Debug)]
pub struct Response {
    raw: Option<HttpResponse>,
    error: Option<Error>,
    request: Option<HttpRequest>,
}

impl Response {
    pub(crate) fn new(result: Result<HttpResponse>, attempted: Option<HttpRequest>) -> Self {
        match result {
            Ok(mut raw) => {
                let request = match attempted {
                    Some(request) => Some(raw.request_or_insert(request).clone()),
                    None => raw.request().cloned(),
                };
                Self {
                    raw: Some(raw),
                    error: None,
                    request,
                }
            }
            Err(error) => Self {
                raw: None,
                error: Some(error),
                request: attempted,
            },
        }
    }

    /// The error of this call, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Whether the call completed without error.
    ///
    /// A 4xx or 5xx status is not an error unless a middleware such as
    /// [`errors`](crate::middleware::errors) made it one.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Status code of the raw response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.raw.as_ref().map(HttpResponse::status)
    }

    /// Headers of the raw response.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.raw.as_ref().map(HttpResponse::headers)
    }

    /// The request that was attempted, if the chain reached dispatch.
    #[must_use]
    pub const fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }

    /// The raw response, absent when the call failed.
    #[must_use]
    pub const fn raw(&self) -> Option<&HttpResponse> {
        self.raw.as_ref()
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<HttpResponse> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.raw
            .ok_or_else(|| Error::invalid_request("no response was produced"))
    }

    /// Response body.
    pub fn bytes(self) -> Result<Bytes> {
        self.into_result().map(HttpResponse::into_body)
    }

    /// Response body as UTF-8 text.
    pub fn text(self) -> Result<String> {
        self.into_result()?.text()
    }

    /// Deserialize the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        self.into_result()?.json()
    }

    /// Write the response body to `path`, creating or truncating the file.
    pub async fn save_to_file(self, path: impl AsRef<Path>) -> Result<()> {
        let body = self.bytes()?;
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(&body).await?;
        file.flush().await?;
        Ok(())
    }
}

//! Buffered HTTP response as returned by a [`Transport`](crate::Transport).

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::HttpRequest;

/// HTTP response with status, headers, body and the request that produced it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    request: Option<HttpRequest>,
}

impl HttpResponse {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            request: None,
        }
    }

    /// Empty `200 OK` response.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), Bytes::new())
    }

    /// Attach the request this response answers.
    #[must_use]
    pub fn with_request(mut self, request: HttpRequest) -> Self {
        self.request = Some(request);
        self
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// The request that produced this response, if the transport recorded it.
    #[must_use]
    pub const fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }

    /// Set the request unless one is already recorded.
    pub fn request_or_insert(&mut self, request: HttpRequest) -> &HttpRequest {
        self.request.get_or_insert(request)
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Status is 3xx.
    #[must_use]
    pub fn is_redirection(&self) -> bool {
        self.status.is_redirection()
    }

    /// Status is 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Status is 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> crate::Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_status_checks() {
        let response = HttpResponse::new(StatusCode::MOVED_PERMANENTLY, HeaderMap::new(), "");
        assert!(response.is_redirection());

        let response = HttpResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), "");
        assert!(response.is_client_error());

        let response = HttpResponse::new(StatusCode::BAD_GATEWAY, HeaderMap::new(), "");
        assert!(response.is_server_error());

        assert!(HttpResponse::ok().is_success());
    }

    #[test]
    fn response_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct User {
            id: u64,
        }

        let response = HttpResponse::new(StatusCode::OK, HeaderMap::new(), r#"{"id":1}"#);
        let user: User = response.json().expect("deserialize");
        assert_eq!(user, User { id: 1 });
    }

    #[test]
    fn response_text_rejects_invalid_utf8() {
        let response = HttpResponse::new(StatusCode::OK, HeaderMap::new(), vec![0xff, 0xfe]);
        assert!(response.text().is_err());
    }

    #[test]
    fn request_or_insert_keeps_existing() {
        let first = HttpRequest::new(http::Method::GET, "http://a.example");
        let second = HttpRequest::new(http::Method::GET, "http://b.example");

        let mut response = HttpResponse::ok().with_request(first);
        let kept = response.request_or_insert(second);
        assert_eq!(kept.host(), Some("a.example"));
    }
}

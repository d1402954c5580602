//! Outgoing HTTP request.
//!
//! An [`HttpRequest`] starts empty (GET, no URL, no headers, empty body) and is
//! filled in by middleware on its way down the chain. It carries its
//! [`Context`], so handlers receive request and context as one value.
//!
//! ```
//! use tether_core::{HttpRequest, Method};
//!
//! let mut request = HttpRequest::default();
//! request.set_method(Method::POST);
//! request.url_mut().set_scheme("https");
//! request.url_mut().set_host("api.example.com");
//! request.url_mut().push_path("users");
//!
//! assert_eq!(request.url().to_string(), "https://api.example.com/users");
//! ```

use bytes::Bytes;
use http::{HeaderMap, Method};

use crate::{Context, RequestUrl};

/// An HTTP request under construction.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    method: Method,
    url: RequestUrl,
    headers: HeaderMap,
    body: Bytes,
    context: Context,
}

impl HttpRequest {
    /// Create a request with the given method and URL.
    #[must_use]
    pub fn new(method: Method, url: impl Into<RequestUrl>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Replace the method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &RequestUrl {
        &self.url
    }

    /// Mutable access to the URL.
    pub fn url_mut(&mut self) -> &mut RequestUrl {
        &mut self.url
    }

    /// Replace the URL.
    pub fn set_url(&mut self, url: impl Into<RequestUrl>) {
        self.url = url.into();
    }

    /// Authority of the URL, if set.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        Some(self.url.host()).filter(|host| !host.is_empty())
    }

    /// Request headers.
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

    /// Request body (empty when unset).
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Call-scoped context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the context.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Replace the context.
    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    /// Consume into (method, url, headers, body, context).
    #[must_use]
    pub fn into_parts(self) -> (Method, RequestUrl, HeaderMap, Bytes, Context) {
        (self.method, self.url, self.headers, self.body, self.context)
    }
}

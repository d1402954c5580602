//! Error types for tether.
//!
//! Every failure in a pipeline surfaces as an [`Error`]: a middleware declining
//! to call its `next` handler, the transport failing, a redirect hook aborting,
//! or the call context being cancelled. The engine never wraps or translates
//! these, so what a middleware returns is what the caller sees.

use derive_more::{Display, Error, From};

/// Boxed error produced by third-party middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for tether operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// HTTP-level errors (non-2xx status codes), produced by status-checking middleware.
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Transport-level request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The call context was cancelled.
    #[display("request cancelled")]
    #[from(skip)]
    Cancelled,

    /// The call context deadline elapsed.
    #[display("context deadline exceeded")]
    #[from(skip)]
    DeadlineExceeded,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Invalid header name or value.
    #[display("invalid header '{name}': {message}")]
    #[from(skip)]
    InvalidHeader {
        /// Header name as given by the caller.
        name: String,
        /// Why the header was rejected.
        message: String,
    },

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    QuerySerialization(serde_html_form::ser::Error),

    /// Response body is not valid UTF-8.
    #[display("invalid UTF-8 body: {_0}")]
    #[from]
    InvalidUtf8(std::string::FromUtf8Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Too many redirects.
    #[display("stopped after {max} redirects")]
    #[from(skip)]
    TooManyRedirects {
        /// Number of requests already attempted.
        count: usize,
        /// Maximum allowed redirects.
        max: usize,
    },

    /// Invalid redirect response.
    #[display("invalid redirect: {_0}")]
    #[from(skip)]
    InvalidRedirect(#[error(not(source))] String),

    /// Local I/O error (e.g. while saving a body to disk).
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),

    /// Error raised by a custom middleware.
    #[display("middleware error: {_0}")]
    #[from(skip)]
    Middleware(#[error(not(source))] BoxError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error raised by a middleware.
    #[must_use]
    pub fn custom(error: impl Into<BoxError>) -> Self {
        Self::Middleware(error.into())
    }

    /// Returns `true` if this is a transport timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if the call context was cancelled or its deadline elapsed.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if a redirect hook stopped the redirect chain.
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::TooManyRedirects { .. } | Self::InvalidRedirect(_))
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::http(404, "Not Found");
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");

        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "request cancelled");

        let err = Error::TooManyRedirects { count: 10, max: 10 };
        assert_eq!(err.to_string(), "stopped after 10 redirects");

        let err = Error::invalid_header("X Bad", "invalid HTTP header name");
        assert_eq!(
            err.to_string(),
            "invalid header 'X Bad': invalid HTTP header name"
        );
    }

    #[test]
    fn error_status() {
        let err = Error::http(404, "Not Found");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = Error::http(503, "Service Unavailable");
        assert!(err.is_server_error());

        assert_eq!(Error::Timeout.status(), None);
    }

    #[test]
    fn cancellation_is_distinguishable() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::DeadlineExceeded.is_cancelled());
        assert!(!Error::Timeout.is_cancelled());
        assert!(!Error::connection("reset").is_cancelled());
    }

    #[test]
    fn custom_error_displays_inner() {
        let io = std::io::Error::other("boom");
        let err = Error::custom(io);
        assert!(matches!(err, Error::Middleware(_)));
        assert_eq!(err.to_string(), "middleware error: boom");
    }

    #[test]
    fn error_decode_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct ApiError {
            error: String,
        }

        let body = bytes::Bytes::from(r#"{"error": "not found"}"#);
        let err = Error::http_with_body(404, "Not Found", body);
        let decoded = err
            .decode_body::<ApiError>()
            .expect("has body")
            .expect("decodes");
        assert_eq!(decoded.error, "not found");

        assert!(Error::Timeout.decode_body::<ApiError>().is_none());
    }
}

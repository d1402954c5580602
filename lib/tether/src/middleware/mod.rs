//! Ready-made middleware.
//!
//! Request-building middleware edit the outgoing [`HttpRequest`](crate::HttpRequest)
//! and call `next`; they back the builder methods of
//! [`Request`](crate::Request) and can also be pushed onto any chain:
//!
//! | Module | Middleware |
//! |--------|------------|
//! | headers | [`method`], [`set_header`], [`add_header`], [`set_headers`], [`bearer_auth`], [`basic_auth`] |
//! | url | [`url()`], [`base_url`], [`path`], [`add_path`], [`param`], [`params`] |
//! | query | [`add_query`], [`set_query`], [`set_query_params`], [`query`] |
//! | cookies | [`add_cookie`], [`set_cookie`] |
//! | body | [`body`], [`text`], [`json`], [`form`] |
//!
//! Response-side middleware:
//!
//! - [`errors`] - turns 4xx/5xx into [`Error::Http`](crate::Error::Http)
//! - [`logging`] / [`debug_logging`] - `tracing` events per exchange
//! - `metrics` (feature `middleware-metrics`) - request counter and latency histogram
//!
//! # Example
//!
//! ```ignore
//! use tether::{Client, middleware};
//!
//! let mut client = Client::new();
//! client
//!     .with(middleware::base_url("https://api.example.com"))
//!     .with(middleware::bearer_auth("token"))
//!     .with(middleware::errors());
//! ```

mod body;
mod cookies;
mod errors;
mod headers;
mod logging;
#[cfg(feature = "middleware-metrics")]
mod metrics;
mod query;
mod url;

pub use body::{body, form, json, text};
pub use cookies::{Cookie, add_cookie, set_cookie};
pub use errors::errors;
pub use headers::{add_header, basic_auth, bearer_auth, method, set_header, set_headers};
pub use logging::{LogLevel, Logging, LoggingLayer, debug_logging, logging};
#[cfg(feature = "middleware-metrics")]
pub use self::metrics::metrics;
pub use query::{add_query, query, set_query, set_query_params};
pub use self::url::{add_path, base_url, param, params, path, url};

#[cfg(test)]
pub(crate) mod test_support {
    use tether_core::{Error, HttpRequest, HttpResponse, Middleware, Result, handler_fn};
    use tower::ServiceExt;

    /// Run `middleware` from an empty request and return the request that
    /// reached the terminal.
    pub(crate) async fn apply(middleware: impl Middleware) -> Result<HttpRequest> {
        let response = respond(middleware, HttpResponse::ok()).await?;
        response
            .request()
            .cloned()
            .ok_or_else(|| Error::invalid_request("terminal was not reached"))
    }

    /// Run `middleware` around a terminal answering `response`.
    pub(crate) async fn respond(
        middleware: impl Middleware,
        response: HttpResponse,
    ) -> Result<HttpResponse> {
        let handler = middleware.wrap(handler_fn(move |request| {
            let response = response.clone();
            async move { Ok(response.with_request(request)) }
        }));
        handler.oneshot(HttpRequest::default()).await
    }
}

//! Request/response logging middleware.
//!
//! Logs each exchange through the `tracing` crate inside an `http_request`
//! span. Method and URL are taken from the request recorded on the response,
//! i.e. the request that actually reached dispatch.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tether_core::{Error, HttpRequest, HttpResponse, Middleware, Result, from_layer};
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```ignore
/// use tether::{Chain, middleware::LoggingLayer};
///
/// let mut chain = Chain::new();
/// chain.push_layer(LoggingLayer::debug());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogLevel {
    /// Log at debug level (request/response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Logging<S> {
    /// Create a new logging service wrapping the given service.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            level: LogLevel::Info,
        }
    }
}

impl<S> Service<HttpRequest> for Logging<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = HttpResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let level = self.level;
        let span = span!(Level::INFO, "http_request");

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                let result = inner.call(request).await;
                let elapsed = start.elapsed();

                // Saturating conversion to u64 (truncates after ~584 million years)
                let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        let (method, url) = response
                            .request()
                            .map(|r| (r.method().to_string(), r.url().to_string()))
                            .unwrap_or_default();
                        if matches!(level, LogLevel::Debug) {
                            debug!(
                                %method,
                                %url,
                                status,
                                elapsed_ms,
                                headers = ?response.headers(),
                                "response received"
                            );
                        }
                        if response.is_client_error() || response.is_server_error() {
                            warn!(%method, %url, status, elapsed_ms, "request failed with HTTP error");
                        } else {
                            info!(%method, %url, status, elapsed_ms, "request completed");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Info-level logging middleware.
pub fn logging() -> impl Middleware {
    from_layer(LoggingLayer::new())
}

/// Debug-level logging middleware, including response headers.
pub fn debug_logging() -> impl Middleware {
    from_layer(LoggingLayer::debug())
}

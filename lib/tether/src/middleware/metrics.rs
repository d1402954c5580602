//! Metrics middleware using the metrics crate facade.
//!
//! Records HTTP metrics with the `metrics` crate, which allows integration
//! with various metrics backends (Prometheus, `StatsD`, etc.). Meant for the
//! after phase ([`Client::with_post`](crate::Client::with_post)), where it
//! runs exactly once per send and sees the final outcome.

use std::time::Instant;

use tether_core::{Handler, HttpRequest, Middleware, from_fn, handler_fn};
use tower::ServiceExt;

use crate::SentAt;

/// Labels used for metrics.
const LABEL_METHOD: &str = "method";
const LABEL_STATUS: &str = "status";

/// Metric names.
const METRIC_REQUESTS_TOTAL: &str = "http_client_requests_total";
const METRIC_REQUEST_DURATION: &str = "http_client_request_duration_seconds";

/// Middleware recording request count and latency.
///
/// - `http_client_requests_total` (counter): labeled by method and status
/// - `http_client_request_duration_seconds` (histogram): labeled by method,
///   measured from the moment the request was sent
pub fn metrics() -> impl Middleware {
    from_fn(|next: Handler| {
        handler_fn(move |request: HttpRequest| {
            let next = next.clone();
            async move {
                let start = request
                    .context()
                    .value::<SentAt>()
                    .map_or_else(Instant::now, |sent| sent.0);
                let method = request.method().to_string();

                let result = next.oneshot(request).await;

                let duration = start.elapsed().as_secs_f64();
                metrics::histogram!(METRIC_REQUEST_DURATION, LABEL_METHOD => method.clone())
                    .record(duration);

                let status = match &result {
                    Ok(response) => response.status().as_u16().to_string(),
                    Err(_) => "error".to_string(),
                };
                metrics::counter!(
                    METRIC_REQUESTS_TOTAL,
                    LABEL_METHOD => method,
                    LABEL_STATUS => status
                )
                .increment(1);

                result
            }
        })
    })
}

//! Transport boundary.
//!
//! A [`Transport`] performs one fully built [`HttpRequest`] and returns the
//! buffered [`HttpResponse`]. It is the only network-facing contract of the
//! pipeline; connection pooling, TLS and redirect following are the
//! implementation's business. Transports are shared between concurrent calls,
//! so they must be `Send + Sync` and are never mutated by the chain machinery.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{HttpRequest, HttpResponse, Result};

/// Boxed, sendable future returned by transports.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Capability to perform an HTTP exchange.
pub trait Transport: Send + Sync + 'static {
    /// Perform the request and return the response.
    ///
    /// Implementations should set [`HttpResponse::request`] to the request that
    /// was finally answered (after any redirects they follow).
    fn round_trip(&self, request: HttpRequest) -> BoxFuture<Result<HttpResponse>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn round_trip(&self, request: HttpRequest) -> BoxFuture<Result<HttpResponse>> {
        (**self).round_trip(request)
    }
}

/// Transport backed by an async closure, handy for stubs and tests.
#[derive(Clone)]
pub struct TransportFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportFn").finish_non_exhaustive()
    }
}

/// Build a [`Transport`] from an async closure.
///
/// ```
/// use tether_core::{HttpResponse, transport_fn};
///
/// let transport = transport_fn(|request| async move {
///     Ok(HttpResponse::ok().with_request(request))
/// });
/// # let _ = transport;
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
{
    TransportFn { f }
}

impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
{
    fn round_trip(&self, request: HttpRequest) -> BoxFuture<Result<HttpResponse>> {
        Box::pin((self.f)(request))
    }
}

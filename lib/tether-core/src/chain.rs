//! Middleware chain engine.
//!
//! A [`Handler`] turns an [`HttpRequest`] into an [`HttpResponse`] or an
//! [`Error`]. A [`Middleware`] wraps a handler into a new handler. A [`Chain`]
//! is an ordered list of middleware compiled into one handler around a
//! terminal handler with [`Chain::exec`]:
//!
//! ```text
//! exec(h) = m1(m2(...mN(h)))
//! ```
//!
//! The first middleware pushed is the outermost: it sees the request first and
//! the response last.
//!
//! ```
//! use tether_core::{Chain, HttpRequest, HttpResponse, handler_fn, map_request};
//! use tower::ServiceExt;
//!
//! # async fn demo() -> tether_core::Result<()> {
//! let mut chain = Chain::new();
//! chain.push(map_request(|request| {
//!     request.url_mut().set_path("/ping");
//!     Ok(())
//! }));
//!
//! let handler = chain.exec(handler_fn(|request| async move {
//!     Ok(HttpResponse::ok().with_request(request))
//! }));
//! let response = handler.oneshot(HttpRequest::default()).await?;
//! assert_eq!(response.request().map(|r| r.url().path()), Some("/ping"));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use tower::util::BoxCloneService;
use tower::{Layer, Service, ServiceExt};

use crate::{Error, HttpRequest, HttpResponse, Result};

/// Type-erased, cloneable request handler.
pub type Handler = BoxCloneService<HttpRequest, HttpResponse, Error>;

/// Build a [`Handler`] from an async closure.
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: FnMut(HttpRequest) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
{
    BoxCloneService::new(tower::service_fn(f))
}

/// Wraps a [`Handler`] into a new [`Handler`].
///
/// Wrapping must not perform any work: effects belong in the returned handler,
/// which runs when the request is sent.
pub trait Middleware: Send + Sync + 'static {
    /// Wrap `next`.
    fn wrap(&self, next: Handler) -> Handler;
}

/// Shared, type-erased middleware.
pub type BoxMiddleware = Arc<dyn Middleware>;

impl Middleware for BoxMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        (**self).wrap(next)
    }
}

/// Erase a middleware's type.
pub fn boxed<M: Middleware>(middleware: M) -> BoxMiddleware {
    Arc::new(middleware)
}

// ============================================================================
// Adapters
// ============================================================================

/// Middleware that returns `next` unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Middleware for Identity {
    fn wrap(&self, next: Handler) -> Handler {
        next
    }
}

/// Middleware that does nothing.
#[must_use]
pub const fn identity() -> Identity {
    Identity
}

/// Middleware backed by a bare `Fn(Handler) -> Handler`.
#[derive(Clone)]
pub struct MiddlewareFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for MiddlewareFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareFn").finish_non_exhaustive()
    }
}

/// Adapt a wrapping function into a [`Middleware`].
pub fn from_fn<F>(f: F) -> MiddlewareFn<F>
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    MiddlewareFn { f }
}

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    fn wrap(&self, next: Handler) -> Handler {
        (self.f)(next)
    }
}

/// Middleware backed by a tower [`Layer`].
#[derive(Debug, Clone)]
pub struct LayerMiddleware<L> {
    layer: L,
}

/// Adapt a tower [`Layer`] over [`Handler`] into a [`Middleware`].
pub fn from_layer<L>(layer: L) -> LayerMiddleware<L>
where
    LayerMiddleware<L>: Middleware,
{
    LayerMiddleware { layer }
}

impl<L> Middleware for LayerMiddleware<L>
where
    L: Layer<Handler> + Send + Sync + 'static,
    L::Service: Service<HttpRequest, Response = HttpResponse, Error = Error> + Clone + Send + 'static,
    <L::Service as Service<HttpRequest>>::Future: Send + 'static,
{
    fn wrap(&self, next: Handler) -> Handler {
        BoxCloneService::new(self.layer.layer(next))
    }
}

/// Middleware that edits the outgoing request, possibly failing the chain.
#[derive(Clone)]
pub struct MapRequest<F> {
    f: Arc<F>,
}

impl<F> std::fmt::Debug for MapRequest<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapRequest").finish_non_exhaustive()
    }
}

/// Middleware that runs `f` on the request before calling `next`.
///
/// When `f` fails, `next` is never called and the error is returned as is.
pub fn map_request<F>(f: F) -> MapRequest<F>
where
    F: Fn(&mut HttpRequest) -> Result<()> + Send + Sync + 'static,
{
    MapRequest { f: Arc::new(f) }
}

impl<F> Middleware for MapRequest<F>
where
    F: Fn(&mut HttpRequest) -> Result<()> + Send + Sync + 'static,
{
    fn wrap(&self, next: Handler) -> Handler {
        let f = Arc::clone(&self.f);
        handler_fn(move |mut request: HttpRequest| {
            let outcome = f(&mut request);
            let next = next.clone();
            async move {
                outcome?;
                next.oneshot(request).await
            }
        })
    }
}

/// Middleware that post-processes a successful response.
#[derive(Clone)]
pub struct MapResponse<F> {
    f: Arc<F>,
}

impl<F> std::fmt::Debug for MapResponse<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapResponse").finish_non_exhaustive()
    }
}

/// Middleware that runs `f` on the response returned by `next`.
///
/// Errors from `next` pass through untouched.
pub fn map_response<F>(f: F) -> MapResponse<F>
where
    F: Fn(HttpResponse) -> Result<HttpResponse> + Send + Sync + 'static,
{
    MapResponse { f: Arc::new(f) }
}

impl<F> Middleware for MapResponse<F>
where
    F: Fn(HttpResponse) -> Result<HttpResponse> + Send + Sync + 'static,
{
    fn wrap(&self, next: Handler) -> Handler {
        let f = Arc::clone(&self.f);
        handler_fn(move |request: HttpRequest| {
            let f = Arc::clone(&f);
            let next = next.clone();
            async move {
                let response = next.oneshot(request).await?;
                f(response)
            }
        })
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Ordered, forkable list of middleware.
///
/// Cloning a chain (or calling [`fork`](Self::fork)) copies the list, so
/// pushing onto the copy never affects the original and vice versa.
/// A chain is itself a [`Middleware`]: pushed into another chain it acts as
/// one element that keeps its own internal order.
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<BoxMiddleware>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.middlewares.len())
            .finish()
    }
}

impl Chain {
    /// Empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Append a middleware.
    pub fn push<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Append an already type-erased middleware.
    pub fn push_boxed(&mut self, middleware: BoxMiddleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Append a bare wrapping function.
    pub fn push_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        self.push(from_fn(f))
    }

    /// Append a middleware, or [`Identity`] when `None`.
    ///
    /// Keeps positions stable for callers that add middleware conditionally.
    pub fn push_opt<M: Middleware>(&mut self, middleware: Option<M>) -> &mut Self {
        match middleware {
            Some(middleware) => self.push(middleware),
            None => self.push(Identity),
        }
    }

    /// Append a tower [`Layer`] over [`Handler`].
    pub fn push_layer<L>(&mut self, layer: L) -> &mut Self
    where
        LayerMiddleware<L>: Middleware,
    {
        self.push(from_layer(layer))
    }

    /// Independent copy of this chain.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Number of middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Whether the chain holds no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Compile the chain around `terminal`.
    ///
    /// Folds from the last middleware to the first, so the first pushed ends
    /// up outermost. An empty chain returns `terminal` unchanged. Nothing runs
    /// until the returned handler is called.
    #[must_use]
    pub fn exec(&self, terminal: Handler) -> Handler {
        tracing::trace!(len = self.middlewares.len(), "compiling chain");
        self.middlewares
            .iter()
            .rev()
            .fold(terminal, |next, middleware| middleware.wrap(next))
    }
}

impl Middleware for Chain {
    fn wrap(&self, next: Handler) -> Handler {
        self.exec(next)
    }
}

impl From<Vec<BoxMiddleware>> for Chain {
    fn from(middlewares: Vec<BoxMiddleware>) -> Self {
        Self { middlewares }
    }
}

impl FromIterator<BoxMiddleware> for Chain {
    fn from_iter<I: IntoIterator<Item = BoxMiddleware>>(iter: I) -> Self {
        Self {
            middlewares: iter.into_iter().collect(),
        }
    }
}

impl Extend<BoxMiddleware> for Chain {
    fn extend<I: IntoIterator<Item = BoxMiddleware>>(&mut self, iter: I) {
        self.middlewares.extend(iter);
    }
}

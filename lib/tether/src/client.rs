//! HTTP client: a transport plus client-wide middleware.

use std::sync::Arc;

use http::Method;
use tether_core::{BoxMiddleware, Chain, Context, Handler, Middleware, Transport};

use crate::{HyperTransport, Request, Response, Stage};

/// Entry point: shared transport, before chain and after chain.
///
/// The chains are templates. Every [`Request`] gets its own copy, so adding
/// middleware to the client only affects requests created afterwards, and
/// adding middleware to a request never touches the client.
///
/// # Example
///
/// ```ignore
/// use tether::{Client, middleware};
///
/// let mut client = Client::new();
/// client
///     .with(middleware::base_url("https://api.example.com"))
///     .with(middleware::logging());
///
/// let response = client.get().path("/health").send().await;
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    before: Chain,
    after: Chain,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("before", &self.before)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client using the shared default [`HyperTransport`].
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Client sending through `transport`.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::builder().transport(transport).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The transport requests are sent through.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Client-wide before chain.
    #[must_use]
    pub const fn before(&self) -> &Chain {
        &self.before
    }

    /// Client-wide after chain.
    #[must_use]
    pub const fn after(&self) -> &Chain {
        &self.after
    }

    /// Append a middleware to the before chain.
    pub fn with<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.before.push(middleware);
        self
    }

    /// Append a bare wrapping function to the before chain.
    pub fn with_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        self.before.push_fn(f);
        self
    }

    /// Append a middleware to the after chain.
    ///
    /// After middleware run exactly once per send, once every before and
    /// per-request middleware has returned. They see the final outcome,
    /// error included.
    pub fn with_post<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.after.push(middleware);
        self
    }

    /// Append a bare wrapping function to the after chain.
    pub fn with_post_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        self.after.push_fn(f);
        self
    }

    /// New request with copies of both chains.
    #[must_use]
    pub fn request(&self) -> Request {
        tracing::trace!(before = self.before.len(), after = self.after.len(), "new request");
        Request::new(
            Arc::clone(&self.transport),
            self.before.fork(),
            self.after.fork(),
        )
    }

    /// New `GET` request.
    #[must_use]
    pub fn get(&self) -> Request {
        self.request().method(Method::GET)
    }

    /// New `POST` request.
    #[must_use]
    pub fn post(&self) -> Request {
        self.request().method(Method::POST)
    }

    /// New `PUT` request.
    #[must_use]
    pub fn put(&self) -> Request {
        self.request().method(Method::PUT)
    }

    /// New `DELETE` request.
    #[must_use]
    pub fn delete(&self) -> Request {
        self.request().method(Method::DELETE)
    }

    /// New `PATCH` request.
    #[must_use]
    pub fn patch(&self) -> Request {
        self.request().method(Method::PATCH)
    }

    /// New `HEAD` request.
    #[must_use]
    pub fn head(&self) -> Request {
        self.request().method(Method::HEAD)
    }

    /// New `OPTIONS` request.
    #[must_use]
    pub fn options(&self) -> Request {
        self.request().method(Method::OPTIONS)
    }

    /// Build a request from `middlewares` and send it with a background context.
    pub async fn execute<I>(&self, middlewares: I) -> Response
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        self.execute_ctx(Context::background(), middlewares).await
    }

    /// Build a request from `middlewares` and send it with `context`.
    pub async fn execute_ctx<I>(&self, context: Context, middlewares: I) -> Response
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        middlewares
            .into_iter()
            .fold(self.request().set_context(context), Request::with_boxed)
            .send()
            .await
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Client {
    async fn execute_ctx(&self, context: Context, middlewares: Vec<BoxMiddleware>) -> Response {
        Self::execute_ctx(self, context, middlewares).await
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    before: Chain,
    after: Chain,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("custom_transport", &self.transport.is_some())
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}

impl ClientBuilder {
    /// Send through `transport` instead of the shared [`HyperTransport`].
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Like [`transport`](Self::transport); `None` keeps the default.
    #[must_use]
    pub fn transport_opt(mut self, transport: Option<Arc<dyn Transport>>) -> Self {
        self.transport = transport;
        self
    }

    /// Append a middleware to the before chain.
    #[must_use]
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.before.push(middleware);
        self
    }

    /// Append several middleware to the before chain.
    #[must_use]
    pub fn with_all<I>(mut self, middlewares: I) -> Self
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        self.before.extend(middlewares);
        self
    }

    /// Append a middleware to the after chain.
    #[must_use]
    pub fn with_post<M: Middleware>(mut self, middleware: M) -> Self {
        self.after.push(middleware);
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> Client {
        let transport = self.transport.unwrap_or_else(|| {
            let shared: Arc<dyn Transport> = HyperTransport::shared();
            shared
        });
        Client {
            transport,
            before: self.before,
            after: self.after,
        }
    }
}

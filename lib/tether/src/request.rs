//! Request builder and `send`.
//!
//! A [`Request`] is a list of middleware waiting to be run: every builder
//! method pushes one onto the request's own before chain and nothing happens
//! until [`Request::send`]. Sending:
//!
//! 1. uses the context set with [`Request::set_context`], or a background one;
//! 2. injects the transport into that context
//!    ([`context::get_transport`](crate::context::get_transport) finds it);
//! 3. compiles the before chain around the dispatch step and runs it from an
//!    empty [`HttpRequest`];
//! 4. runs the after chain once, around the outcome of step 3;
//! 5. wraps the outcome into a [`Response`].
//!
//! ```ignore
//! use tether::Client;
//!
//! let client = Client::new();
//! let response = client
//!     .get()
//!     .url("https://api.example.com")
//!     .path("/users/:id")
//!     .param("id", "42")
//!     .set_header("Accept", "application/json")
//!     .send()
//!     .await;
//! let user: User = response.json()?;
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use tether_core::context::set_transport;
use tether_core::{
    BoxMiddleware, Chain, Context, Error, Handler, HttpRequest, HttpResponse, Middleware, Result,
    Transport, handler_fn,
};
use tower::ServiceExt;

use crate::Response;
use crate::middleware::{self, Cookie};

/// Moment [`Request::send`] started, stored in the call context.
#[derive(Debug, Clone, Copy)]
pub struct SentAt(pub Instant);

/// A request being built: transport plus before and after chains.
pub struct Request {
    transport: Arc<dyn Transport>,
    before: Chain,
    after: Chain,
    context: Option<Context>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("before", &self.before)
            .field("after", &self.after)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Request {
    /// Create a request sending through `transport` with the given chains.
    ///
    /// Usually obtained from [`Client::request`](crate::Client::request).
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, before: Chain, after: Chain) -> Self {
        Self {
            transport,
            before,
            after,
            context: None,
        }
    }

    /// The context set with [`set_context`](Self::set_context), if any.
    #[must_use]
    pub const fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Use `context` for this request.
    #[must_use]
    pub fn set_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// The transport this request is sent through.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The before chain: client middleware followed by this request's own.
    #[must_use]
    pub const fn before(&self) -> &Chain {
        &self.before
    }

    /// The after chain.
    #[must_use]
    pub const fn after(&self) -> &Chain {
        &self.after
    }

    /// Independent copy: middleware added to either one is not seen by the other.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            before: self.before.fork(),
            after: self.after.fork(),
            context: self.context.clone(),
        }
    }

    /// Append a middleware to this request.
    #[must_use]
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.before.push(middleware);
        self
    }

    /// Append an already type-erased middleware.
    #[must_use]
    pub fn with_boxed(mut self, middleware: BoxMiddleware) -> Self {
        self.before.push_boxed(middleware);
        self
    }

    /// Append a bare wrapping function.
    #[must_use]
    pub fn with_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        self.before.push_fn(f);
        self
    }

    // ========================================================================
    // Builder sugar
    // ========================================================================

    /// Set the HTTP method.
    #[must_use]
    pub fn method(self, method: Method) -> Self {
        self.with(middleware::method(method))
    }

    /// Replace the URL; `http://` is assumed when no scheme is given.
    #[must_use]
    pub fn url(self, raw: impl Into<String>) -> Self {
        self.with(middleware::url(raw))
    }

    /// Take scheme and host from `raw`.
    #[must_use]
    pub fn base_url(self, raw: impl Into<String>) -> Self {
        self.with(middleware::base_url(raw))
    }

    /// Replace the URL path.
    #[must_use]
    pub fn path(self, path: impl Into<String>) -> Self {
        self.with(middleware::path(path))
    }

    /// Append a path segment.
    #[must_use]
    pub fn add_path(self, segment: impl Into<String>) -> Self {
        self.with(middleware::add_path(segment))
    }

    /// Replace the `:key` path segment with `value`.
    #[must_use]
    pub fn param(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(middleware::param(key, value))
    }

    /// Replace several path parameters.
    #[must_use]
    pub fn params<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with(middleware::params(values))
    }

    /// Append a query parameter.
    #[must_use]
    pub fn add_query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(middleware::add_query(key, value))
    }

    /// Set a query parameter, replacing existing values.
    #[must_use]
    pub fn set_query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(middleware::set_query(key, value))
    }

    /// Set several query parameters.
    #[must_use]
    pub fn set_query_params<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with(middleware::set_query_params(values))
    }

    /// Append the fields of `value` as query parameters.
    #[must_use]
    pub fn query<T: Serialize + Send + Sync + 'static>(self, value: T) -> Self {
        self.with(middleware::query(value))
    }

    /// Set a header, replacing existing values.
    #[must_use]
    pub fn set_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(middleware::set_header(name, value))
    }

    /// Add a header value.
    #[must_use]
    pub fn add_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(middleware::add_header(name, value))
    }

    /// Set several headers.
    #[must_use]
    pub fn set_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with(middleware::set_headers(headers))
    }

    /// Set `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        self.with(middleware::bearer_auth(token))
    }

    /// Set `Authorization: Basic ...`.
    #[must_use]
    pub fn basic_auth(self, username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        self.with(middleware::basic_auth(username, password))
    }

    /// Append a cookie.
    #[must_use]
    pub fn add_cookie(self, cookie: Cookie) -> Self {
        self.with(middleware::add_cookie(cookie))
    }

    /// Set a cookie, replacing one with the same name.
    #[must_use]
    pub fn set_cookie(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(middleware::set_cookie(name, value))
    }

    /// Raw body.
    #[must_use]
    pub fn body(self, bytes: impl Into<Bytes>) -> Self {
        self.with(middleware::body(bytes))
    }

    /// Plain text body.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.with(middleware::text(text))
    }

    /// JSON body.
    #[must_use]
    pub fn json<T: Serialize + Send + Sync + 'static>(self, value: T) -> Self {
        self.with(middleware::json(value))
    }

    /// Form URL-encoded body.
    #[must_use]
    pub fn form<T: Serialize + Send + Sync + 'static>(self, value: T) -> Self {
        self.with(middleware::form(value))
    }

    // ========================================================================
    // Send
    // ========================================================================

    /// Build and send the request.
    ///
    /// Never fails by itself: errors from middleware, the transport or the
    /// context are carried by the returned [`Response`], together with the
    /// request that reached dispatch, if any.
    pub async fn send(self) -> Response {
        let Self {
            transport,
            before,
            after,
            context,
        } = self;

        let context = context
            .unwrap_or_default()
            .with_value(SentAt(Instant::now()));
        let context = set_transport(context, Arc::clone(&transport));

        tracing::trace!(
            before = before.len(),
            after = after.len(),
            "sending request"
        );

        let attempted = Arc::new(Mutex::new(None));
        let handler = before.exec(dispatch(transport, Arc::clone(&attempted)));

        let mut initial = HttpRequest::default();
        initial.set_context(context.clone());
        let outcome = handler.oneshot(initial).await;

        let attempted = attempted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let outcome = if after.is_empty() {
            outcome
        } else {
            let request = attempted.clone().unwrap_or_else(|| {
                let mut request = HttpRequest::default();
                request.set_context(context);
                request
            });
            after.exec(replay(outcome)).oneshot(request).await
        };

        Response::new(outcome, attempted)
    }
}

/// Terminal handler performing the network call.
///
/// Records the request it receives, fails fast on a done context and races
/// the transport against the context.
fn dispatch(transport: Arc<dyn Transport>, attempted: Arc<Mutex<Option<HttpRequest>>>) -> Handler {
    handler_fn(move |request: HttpRequest| {
        let transport = Arc::clone(&transport);
        let attempted = Arc::clone(&attempted);
        async move {
            *attempted.lock().unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

            let context = request.context().clone();
            if let Some(err) = context.err() {
                return Err(err);
            }

            tracing::debug!(method = %request.method(), url = %request.url(), "dispatching request");
            let recorded = request.clone();
            let result = tokio::select! {
                biased;
                () = context.done() => Err(context.err().unwrap_or(Error::Cancelled)),
                result = transport.round_trip(request) => result,
            };

            let mut response = result?;

            response.request_or_insert(recorded);
            Ok(response)
        }
    })
}

/// Terminal handler of the after chain: hands back the before-phase outcome.
///
/// The outcome can be taken once; calling the handler again is an error.
fn replay(outcome: Result<HttpResponse>) -> Handler {
    let slot = Arc::new(Mutex::new(Some(outcome)));
    handler_fn(move |_request: HttpRequest| {
        let slot = Arc::clone(&slot);
        async move {
            let outcome = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            outcome.unwrap_or_else(|| {
                Err(Error::invalid_request(
                    "the outcome of a send can only be consumed once",
                ))
            })
        }
    })
}

//! Reusable middleware bundles stacked in front of a client.
//!
//! A [`Stage`] sends a request built from a list of middleware. [`Client`]
//! is the last stage; a [`Layer`] holds its own chain and a next stage, and on
//! every call puts its chain in front of the caller's middleware before
//! handing the list to the next stage. Endpoint groups can then share
//! behavior without knowing about each other:
//!
//! ```ignore
//! use tether::{Client, Group, Stage, boxed, middleware};
//!
//! let client = Client::new();
//! let mut users = Group::new(client);
//! users
//!     .with(middleware::base_url("https://users.example.com"))
//!     .with(middleware::bearer_auth("token"));
//!
//! let response = users
//!     .execute(vec![boxed(middleware::path("/users/42"))])
//!     .await;
//! ```
//!
//! With layers stacked as `outer -> inner -> client`, a call runs the client's
//! before chain, then `inner`, then `outer`, then the per-call middleware.
//!
//! [`Client`]: crate::Client

use std::future::Future;

use tether_core::{BoxMiddleware, Chain, Context, Handler, Middleware, boxed};

use crate::Response;

/// Something that builds and sends a request from a list of middleware.
pub trait Stage: Send + Sync {
    /// Send a request built from `middlewares`, using `context`.
    fn execute_ctx(
        &self,
        context: Context,
        middlewares: Vec<BoxMiddleware>,
    ) -> impl Future<Output = Response> + Send;

    /// Send a request built from `middlewares` with a background context.
    fn execute(&self, middlewares: Vec<BoxMiddleware>) -> impl Future<Output = Response> + Send {
        self.execute_ctx(Context::background(), middlewares)
    }
}

/// Middleware bundle placed in front of the next [`Stage`].
#[derive(Debug, Clone)]
pub struct Layer<N> {
    chain: Chain,
    next: N,
}

/// Another name for [`Layer`], for grouping endpoints.
pub type Group<N> = Layer<N>;

impl<N: Stage> Layer<N> {
    /// Empty layer in front of `next`.
    #[must_use]
    pub fn new(next: N) -> Self {
        Self {
            chain: Chain::new(),
            next,
        }
    }

    /// Layer with initial middleware in front of `next`.
    #[must_use]
    pub fn with_middlewares<I>(next: N, middlewares: I) -> Self
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        Self {
            chain: middlewares.into_iter().collect(),
            next,
        }
    }

    /// Append a middleware to this layer.
    pub fn with<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.chain.push(middleware);
        self
    }

    /// This layer's chain.
    #[must_use]
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The stage requests are forwarded to.
    #[must_use]
    pub const fn next(&self) -> &N {
        &self.next
    }
}

impl<N: Stage> Stage for Layer<N> {
    fn execute_ctx(
        &self,
        context: Context,
        mut middlewares: Vec<BoxMiddleware>,
    ) -> impl Future<Output = Response> + Send {
        middlewares.insert(0, boxed(self.chain.fork()));
        self.next.execute_ctx(context, middlewares)
    }
}

impl<N: Send + Sync + 'static> Middleware for Layer<N> {
    fn wrap(&self, next: Handler) -> Handler {
        self.chain.exec(next)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tether_core::{HttpResponse, identity, map_request, transport_fn};

    use super::*;
    use crate::Client;

    type Log = Arc<Mutex<Vec<String>>>;

    fn mark(log: &Log, name: &'static str) -> impl Middleware {
        let log = Arc::clone(log);
        map_request(move |_| {
            log.lock().expect("lock").push(name.to_string());
            Ok(())
        })
    }

    fn client(log: &Log) -> Client {
        let mut client = Client::with_transport(Arc::new(transport_fn(|request| async move {
            Ok(HttpResponse::ok().with_request(request))
        })));
        client.with(mark(log, "client"));
        client
    }

    #[tokio::test]
    async fn layer_runs_before_call_middleware() {
        let log = Log::default();
        let mut layer = Layer::new(client(&log));
        layer.with(mark(&log, "layer"));

        let response = layer.execute(vec![boxed(mark(&log, "call"))]).await;

        assert!(response.is_ok());
        assert_eq!(*log.lock().expect("lock"), ["client", "layer", "call"]);
    }

    #[tokio::test]
    async fn stacked_layers_insert_themselves_first() {
        let log = Log::default();
        let mut inner = Group::new(client(&log));
        inner.with(mark(&log, "inner"));
        let mut outer = Group::new(inner);
        outer.with(mark(&log, "outer"));

        let _ = outer.execute(vec![boxed(mark(&log, "call"))]).await;

        assert_eq!(
            *log.lock().expect("lock"),
            ["client", "inner", "outer", "call"]
        );
    }

    #[tokio::test]
    async fn layer_chain_is_not_mutated_by_calls() {
        let log = Log::default();
        let layer = Layer::with_middlewares(client(&log), [boxed(identity())]);

        let _ = layer.execute(vec![boxed(identity())]).await;
        let _ = layer.execute(vec![]).await;

        assert_eq!(layer.chain().len(), 1);
        assert_eq!(layer.next().before().len(), 1);
    }

    #[tokio::test]
    async fn layer_is_a_middleware() {
        let log = Log::default();
        let mut layer = Layer::new(client(&log));
        layer.with(mark(&log, "bundle"));

        let mut other = client(&log);
        other.with(layer);
        let _ = other.get().send().await;

        assert_eq!(*log.lock().expect("lock"), ["client", "bundle"]);
    }

    #[tokio::test]
    async fn execute_ctx_passes_context() {
        #[derive(Clone)]
        struct Tenant(&'static str);

        let log = Log::default();
        let layer = Layer::new(client(&log));
        let seen = Arc::new(Mutex::new(None));
        let probe = Arc::clone(&seen);

        let context = Context::background().with_value(Tenant("acme"));
        let _ = layer
            .execute_ctx(
                context,
                vec![boxed(map_request(move |request| {
                    *probe.lock().expect("lock") = request.context().value::<Tenant>().map(|t| t.0);
                    Ok(())
                }))],
            )
            .await;

        assert_eq!(*seen.lock().expect("lock"), Some("acme"));
    }
}

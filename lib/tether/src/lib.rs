//! Composable, middleware-driven HTTP client.
//!
//! Every aspect of a request (method, URL, headers, body, status handling,
//! logging...) is a [`Middleware`] wrapping the next [`Handler`]. A [`Client`]
//! holds client-wide middleware; each [`Request`] gets its own copy to extend
//! and nothing runs until [`Request::send`].
//!
//! # Example
//!
//! ```ignore
//! use tether::{Client, middleware};
//!
//! #[derive(Debug, serde::Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let mut client = Client::new();
//! client
//!     .with(middleware::base_url("https://api.example.com"))
//!     .with(middleware::errors());
//!
//! let user: User = client
//!     .get()
//!     .path("/users/:id")
//!     .param("id", "42")
//!     .send()
//!     .await
//!     .json()?;
//! ```
//!
//! # Phases
//!
//! - before: client middleware ([`Client::with`]) then request middleware, in
//!   registration order on the way in and reverse order on the way out
//! - dispatch: the [`Transport`] call, bounded by the request [`Context`]
//! - after: client middleware registered with [`Client::with_post`], run once
//!   per send around the outcome of the two previous phases

mod client;
mod config;
mod layer;
pub mod middleware;
pub mod prelude;
pub mod redirect;
mod request;
mod response;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{PoolConfig, RedirectPolicy, TransportConfig, TransportConfigBuilder};
pub use layer::{Group, Layer, Stage};
pub use request::{Request, SentAt};
pub use response::Response;
pub use transport::{HyperTransport, HyperTransportBuilder};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use tether_core::{
    BoxFuture, BoxMiddleware, CancelHandle, Chain, ContentType, Context, Error, Handler,
    HttpRequest, HttpResponse, Identity, LayerMiddleware, MapRequest, MapResponse, Middleware,
    MiddlewareFn, RequestUrl, Result, Transport, TransportFn, boxed, context, from_fn, from_layer,
    from_json, handler_fn, identity, map_request, map_response, to_form, to_json, to_query_pairs,
    transport_fn,
};

// Re-export http types for methods, status codes and headers
pub use tether_core::{HeaderMap, Method, StatusCode, header};

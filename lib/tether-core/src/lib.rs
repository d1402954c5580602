//! Core of the tether HTTP client: the middleware chain engine and the
//! wire-level values that flow through it.
//!
//! - [`Handler`], [`Middleware`] and [`Chain`] - onion-model composition
//! - [`HttpRequest`] / [`RequestUrl`] - the outgoing request, built by middleware
//! - [`HttpResponse`] - the buffered transport response
//! - [`Context`] - call-scoped values, deadline and cancellation
//! - [`Transport`] - the network boundary
//! - [`Error`] and [`Result`] - error handling
//!
//! Most users want the `tether` crate, which adds the client, request builder
//! and a hyper-based transport on top of these types.

mod body;
mod chain;
pub mod context;
mod error;
pub mod prelude;
mod request;
mod request_url;
mod response;
mod transport;

pub use body::{ContentType, from_json, to_form, to_json, to_query_pairs};
pub use chain::{
    BoxMiddleware, Chain, Handler, Identity, LayerMiddleware, MapRequest, MapResponse, Middleware,
    MiddlewareFn, boxed, from_fn, from_layer, handler_fn, identity, map_request, map_response,
};
pub use context::{CancelHandle, Context, get_transport, set_transport};
pub use error::{BoxError, Error, Result};
pub use request::HttpRequest;
pub use request_url::RequestUrl;
pub use response::HttpResponse;
pub use transport::{BoxFuture, Transport, TransportFn, transport_fn};

// Re-export http crate types for methods, status codes and headers
pub use http::{HeaderMap, Method, StatusCode, header};

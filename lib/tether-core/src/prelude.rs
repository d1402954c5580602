//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tether_core::prelude::*;
//! ```

pub use crate::{
    BoxMiddleware, Chain, Context, Error, Handler, HttpRequest, HttpResponse, Method, Middleware,
    RequestUrl, Result, StatusCode, Transport, from_fn, handler_fn, map_request, map_response,
};

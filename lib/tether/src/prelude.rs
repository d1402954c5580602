//! Prelude module for convenient imports.
//!
//! ```ignore
//! use tether::prelude::*;
//! ```

pub use crate::middleware;
pub use crate::{
    BoxMiddleware, Chain, Client, Context, Error, Group, Handler, HttpRequest, HttpResponse,
    Layer, Method, Middleware, Request, Response, Result, Stage, StatusCode, Transport, boxed,
    from_fn, map_request, map_response,
};

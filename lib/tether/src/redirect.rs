//! Redirect decision hooks.
//!
//! [`HyperTransport`](crate::HyperTransport) calls a [`CheckRedirect`] hook
//! before following each redirect. The hook receives the request about to be
//! sent and every request already attempted (`via`, oldest first). Returning
//! an error stops the redirect chain and becomes the error of the call.
//!
//! A redirected request starts with no headers. Install
//! [`copy_headers_redirect`] to carry headers across hops:
//!
//! ```ignore
//! use std::sync::Arc;
//! use tether::{HyperTransport, redirect::copy_headers_redirect};
//!
//! let transport = HyperTransport::builder()
//!     .check_redirect(Arc::new(copy_headers_redirect))
//!     .build();
//! ```

use std::sync::Arc;

use http::header::AUTHORIZATION;
use tether_core::{Error, HttpRequest, Result};

/// Number of requests after which redirects stop being followed.
pub const MAX_REDIRECTS: usize = 10;

/// Hook deciding whether a redirect is followed.
///
/// It may edit the new request (e.g. to copy headers) before it is sent.
pub type CheckRedirect = Arc<dyn Fn(&mut HttpRequest, &[HttpRequest]) -> Result<()> + Send + Sync>;

/// Default hook: follow up to [`MAX_REDIRECTS`] redirects, nothing else.
pub fn default_redirect_policy(_request: &mut HttpRequest, via: &[HttpRequest]) -> Result<()> {
    check_redirect_count(via)
}

/// Follow up to [`MAX_REDIRECTS`] redirects, copying headers from the
/// previous request.
///
/// Headers already set on `request` are never overwritten. `Authorization`
/// is only copied when the new request targets the same host.
pub fn copy_headers_redirect(request: &mut HttpRequest, via: &[HttpRequest]) -> Result<()> {
    check_redirect_count(via)?;

    let Some(previous) = via.last() else {
        return Ok(());
    };
    let same_host = same_host(request, previous);

    for name in previous.headers().keys() {
        if request.headers().contains_key(name) {
            continue;
        }
        if name == AUTHORIZATION && !same_host {
            tracing::debug!(host = ?request.host(), "not forwarding authorization to another host");
            continue;
        }
        for value in previous.headers().get_all(name) {
            request.headers_mut().append(name.clone(), value.clone());
        }
    }
    Ok(())
}

/// Compare hosts the way `url::Url` normalizes them: case-insensitive, with
/// the scheme's default port left out. Falls back to the raw authority when
/// either URL is not absolute.
fn same_host(a: &HttpRequest, b: &HttpRequest) -> bool {
    match (a.url().to_url(), b.url().to_url()) {
        (Ok(a), Ok(b)) => a.host_str() == b.host_str() && a.port() == b.port(),
        _ => a.host() == b.host(),
    }
}

fn check_redirect_count(via: &[HttpRequest]) -> Result<()> {
    if via.len() >= MAX_REDIRECTS {
        return Err(Error::TooManyRedirects {
            count: via.len(),
            max: MAX_REDIRECTS,
        });
    }
    Ok(())
}

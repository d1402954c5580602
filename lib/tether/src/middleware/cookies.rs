//! Cookie middleware.
//!
//! Cookies are written to the single `Cookie` request header as
//! `name=value` pairs separated by `; `.

use http::header::{COOKIE, HeaderValue};
use tether_core::{Error, HttpRequest, Middleware, Result, map_request};

/// A request cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl Cookie {
    /// Create a cookie.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Cookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Append a cookie, even if one with the same name is already present.
pub fn add_cookie(cookie: Cookie) -> impl Middleware {
    map_request(move |request| {
        let mut cookies = current_cookies(request);
        cookies.push(cookie.to_string());
        write_cookies(request, &cookies)
    })
}

/// Set a cookie, replacing a cookie with the same name.
pub fn set_cookie(name: impl Into<String>, value: impl Into<String>) -> impl Middleware {
    let cookie = Cookie::new(name, value);
    map_request(move |request| {
        let mut cookies = current_cookies(request);
        let prefix = format!("{}=", cookie.name);
        match cookies.iter_mut().find(|pair| pair.starts_with(&prefix)) {
            Some(pair) => *pair = cookie.to_string(),
            None => cookies.push(cookie.to_string()),
        }
        write_cookies(request, &cookies)
    })
}

fn current_cookies(request: &HttpRequest) -> Vec<String> {
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn write_cookies(request: &mut HttpRequest, cookies: &[String]) -> Result<()> {
    let value = HeaderValue::from_str(&cookies.join("; "))
        .map_err(|e| Error::invalid_header(COOKIE.as_str(), e))?;
    request.headers_mut().insert(COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tether_core::Chain;

    use super::*;
    use crate::middleware::test_support::apply;

    #[tokio::test]
    async fn add_cookie_appends() {
        let mut chain = Chain::new();
        chain.push(add_cookie(Cookie::new("session", "abc")));
        chain.push(add_cookie(Cookie::new("theme", "dark")));
        chain.push(add_cookie(Cookie::new("theme", "light")));

        let request = apply(chain).await.expect("apply");
        assert_eq!(
            request.header("cookie"),
            Some("session=abc; theme=dark; theme=light")
        );
    }

    #[tokio::test]
    async fn set_cookie_replaces_same_name() {
        let mut chain = Chain::new();
        chain.push(add_cookie(Cookie::new("session", "abc")));
        chain.push(add_cookie(Cookie::new("theme", "dark")));
        chain.push(set_cookie("session", "xyz"));
        chain.push(set_cookie("lang", "en"));

        let request = apply(chain).await.expect("apply");
        assert_eq!(
            request.header("cookie"),
            Some("session=xyz; theme=dark; lang=en")
        );
    }

    #[tokio::test]
    async fn invalid_cookie_fails_the_chain() {
        let err = apply(set_cookie("name", "bad\nvalue"))
            .await
            .expect_err("invalid");
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }
}

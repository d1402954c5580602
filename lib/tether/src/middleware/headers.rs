//! Method and header middleware.

use base64::Engine;
use http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use http::Method;
use tether_core::{Error, HttpRequest, Middleware, Result, map_request};

/// Set the request method.
pub fn method(method: Method) -> impl Middleware {
    map_request(move |request| {
        request.set_method(method.clone());
        Ok(())
    })
}

/// Set a header, replacing every existing value.
pub fn set_header(name: impl Into<String>, value: impl Into<String>) -> impl Middleware {
    let (name, value) = (name.into(), value.into());
    map_request(move |request| {
        let (name, value) = parse_header(&name, &value)?;
        request.headers_mut().insert(name, value);
        Ok(())
    })
}

/// Add a header value, keeping existing values.
pub fn add_header(name: impl Into<String>, value: impl Into<String>) -> impl Middleware {
    let (name, value) = (name.into(), value.into());
    map_request(move |request| {
        let (name, value) = parse_header(&name, &value)?;
        request.headers_mut().append(name, value);
        Ok(())
    })
}

/// Set several headers at once, each replacing existing values.
pub fn set_headers<I, K, V>(headers: I) -> impl Middleware
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let headers: Vec<(String, String)> = headers
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    map_request(move |request| {
        for (name, value) in &headers {
            let (name, value) = parse_header(name, value)?;
            request.headers_mut().insert(name, value);
        }
        Ok(())
    })
}

/// Set `Authorization: Bearer <token>`.
pub fn bearer_auth(token: impl AsRef<str>) -> impl Middleware {
    let value = format!("Bearer {}", token.as_ref());
    authorization(value)
}

/// Set `Authorization: Basic <base64(username:password)>`.
pub fn basic_auth(username: impl AsRef<str>, password: impl AsRef<str>) -> impl Middleware {
    let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    authorization(format!("Basic {encoded}"))
}

fn authorization(value: String) -> impl Middleware {
    map_request(move |request: &mut HttpRequest| {
        let mut value = HeaderValue::from_str(&value)
            .map_err(|e| Error::invalid_header(AUTHORIZATION.as_str(), e))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    })
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::invalid_header(name, e))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e))?;
    Ok((header_name, header_value))
}

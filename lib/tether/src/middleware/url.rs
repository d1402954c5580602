//! URL middleware.
//!
//! Raw URLs without a `://` separator are taken as `http://` URLs, so
//! `"www.example.com/path"` targets `http://www.example.com/path`.

use tether_core::{Middleware, RequestUrl, map_request};

fn parse_lenient(raw: &str) -> RequestUrl {
    if raw.contains("://") {
        RequestUrl::parse(raw)
    } else {
        RequestUrl::parse(&format!("http://{raw}"))
    }
}

/// Replace the whole request URL.
pub fn url(raw: impl Into<String>) -> impl Middleware {
    let parsed = parse_lenient(&raw.into());
    map_request(move |request| {
        request.set_url(parsed.clone());
        Ok(())
    })
}

/// Take only scheme and host from `raw`; path and query are ignored.
pub fn base_url(raw: impl Into<String>) -> impl Middleware {
    let parsed = parse_lenient(&raw.into());
    map_request(move |request| {
        let url = request.url_mut();
        url.set_scheme(parsed.scheme());
        url.set_host(parsed.host());
        Ok(())
    })
}

/// Replace the URL path.
pub fn path(path: impl Into<String>) -> impl Middleware {
    let path = path.into();
    map_request(move |request| {
        request.url_mut().set_path(path.as_str());
        Ok(())
    })
}

/// Append a segment to the URL path.
pub fn add_path(segment: impl Into<String>) -> impl Middleware {
    let segment = segment.into();
    map_request(move |request| {
        request.url_mut().push_path(&segment);
        Ok(())
    })
}

/// Replace the `:key` (or `{key}`) path segment with `value`.
pub fn param(key: impl Into<String>, value: impl Into<String>) -> impl Middleware {
    let (key, value) = (key.into(), value.into());
    map_request(move |request| {
        request.url_mut().replace_param(&key, &value);
        Ok(())
    })
}

/// Replace several path parameters at once.
pub fn params<I, K, V>(values: I) -> impl Middleware
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let values: Vec<(String, String)> = values
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    map_request(move |request| {
        for (key, value) in &values {
            request.url_mut().replace_param(key, value);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tether_core::Chain;

    use super::*;
    use crate::middleware::test_support::apply;

    async fn url_after(chain: Chain) -> String {
        apply(chain).await.expect("apply").url().to_string()
    }

    #[tokio::test]
    async fn url_is_kept_as_given() {
        for raw in [
            "http://example.com",
            "https://example.com/path",
            "https://example.com/path?q=v",
            "http://example.com/s?flag",
            "http://example.com/s?redirect=/home&ids=1,2",
            "http://example.com/s?q=a%20b&sig=abc~def",
        ] {
            let mut chain = Chain::new();
            chain.push(url(raw));
            assert_eq!(url_after(chain).await, raw);
        }
    }

    #[tokio::test]
    async fn url_without_scheme_defaults_to_http() {
        let mut chain = Chain::new();
        chain.push(url(""));
        assert_eq!(url_after(chain).await, "http://");

        let mut chain = Chain::new();
        chain.push(url("www.google.com"));
        assert_eq!(url_after(chain).await, "http://www.google.com");
    }

    #[tokio::test]
    async fn base_url_keeps_scheme_and_host() {
        for (raw, expected) in [
            ("http://example.com", "http://example.com"),
            ("https://example.com/path", "https://example.com"),
            ("https://example.com/path?q=v", "https://example.com"),
        ] {
            let mut chain = Chain::new();
            chain.push(base_url(raw));
            assert_eq!(url_after(chain).await, expected);
        }
    }

    #[tokio::test]
    async fn base_url_then_path() {
        let mut chain = Chain::new();
        chain.push(base_url("https://api.example.com/ignored"));
        chain.push(path("/v1/users"));
        assert_eq!(url_after(chain).await, "https://api.example.com/v1/users");
    }

    #[tokio::test]
    async fn path_alone() {
        for (raw, expected) in [("", ""), ("/path", "/path")] {
            let mut chain = Chain::new();
            chain.push(path(raw));
            assert_eq!(url_after(chain).await, expected);
        }
    }

    #[tokio::test]
    async fn add_path_joins_segments() {
        for (raw, segment, expected) in [
            ("", "", "http://"),
            ("www.google.com", "", "http://www.google.com"),
            ("www.example.com/path", "", "http://www.example.com/path"),
            (
                "www.example.com/path",
                "/additional_path",
                "http://www.example.com/path/additional_path",
            ),
            (
                "https://www.example.com/path",
                "/additional_path",
                "https://www.example.com/path/additional_path",
            ),
        ] {
            let mut chain = Chain::new();
            chain.push(url(raw));
            chain.push(add_path(segment));
            assert_eq!(url_after(chain).await, expected, "{raw} + {segment}");
        }
    }

    #[tokio::test]
    async fn param_replaces_named_segment() {
        let mut chain = Chain::new();
        chain.push(url("www.example.com/:param1/keep/:param2"));
        chain.push(param("param1", "value"));
        assert_eq!(
            url_after(chain).await,
            "http://www.example.com/value/keep/:param2"
        );
    }

    #[tokio::test]
    async fn params_from_map() {
        let mut chain = Chain::new();
        chain.push(url("https://api.example.com/users/{id}/posts/:post"));
        chain.push(params(HashMap::from([("id", "42"), ("post", "a b")])));
        assert_eq!(
            url_after(chain).await,
            "https://api.example.com/users/42/posts/a%20b"
        );
    }

    #[tokio::test]
    async fn empty_params_leave_url_untouched() {
        let mut chain = Chain::new();
        chain.push(url(""));
        chain.push(params(HashMap::<String, String>::new()));
        assert_eq!(url_after(chain).await, "http://");
    }
}

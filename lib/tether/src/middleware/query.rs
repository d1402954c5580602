//! Query string middleware.

use serde::Serialize;
use tether_core::{Middleware, map_request, to_query_pairs};

/// Append a query parameter; existing values for `key` are kept.
pub fn add_query(key: impl Into<String>, value: impl Into<String>) -> impl Middleware {
    let (key, value) = (key.into(), value.into());
    map_request(move |request| {
        request.url_mut().append_query(key.as_str(), value.as_str());
        Ok(())
    })
}

/// Set a query parameter, replacing every existing value for `key`.
pub fn set_query(key: impl Into<String>, value: impl Into<String>) -> impl Middleware {
    let (key, value) = (key.into(), value.into());
    map_request(move |request| {
        request.url_mut().set_query(key.as_str(), value.as_str());
        Ok(())
    })
}

/// Set several query parameters, each replacing existing values.
pub fn set_query_params<I, K, V>(values: I) -> impl Middleware
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
            request.url_mut().set_query(key.as_str(), value.as_str());
        }
        Ok(())
    })
}

/// Append the fields of a serializable value as query parameters.
///
/// Sequence fields become repeated parameters (`tags=a&tags=b`); `None`
/// fields are skipped.
pub fn query<T>(value: T) -> impl Middleware
where
    T: Serialize + Send + Sync + 'static,
{
    map_request(move |request| {
        for (key, value) in to_query_pairs(&value)? {
            request.url_mut().append_query(key, value);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tether_core::Chain;

    use super::*;
    use crate::middleware::test_support::apply;
    use crate::middleware::url;

    async fn url_after(chain: Chain) -> String {
        apply(chain).await.expect("apply").url().to_string()
    }

    #[tokio::test]
    async fn add_query_keeps_duplicates() {
        let mut chain = Chain::new();
        chain.push(url("www.example.com?a=b"));
        chain.push(add_query("a", "c"));
        assert_eq!(url_after(chain).await, "http://www.example.com?a=b&a=c");
    }

    #[tokio::test]
    async fn add_query_on_empty_url() {
        let mut chain = Chain::new();
        chain.push(url(""));
        chain.push(add_query("a", "b"));
        assert_eq!(url_after(chain).await, "http://?a=b");
    }

    #[tokio::test]
    async fn set_query_replaces() {
        let mut chain = Chain::new();
        chain.push(url("www.example.com?a=b"));
        chain.push(set_query("a", "c"));
        assert_eq!(url_after(chain).await, "http://www.example.com?a=c");

        let mut chain = Chain::new();
        chain.push(url("www.example.com/"));
        chain.push(set_query("param1", "value"));
        assert_eq!(
            url_after(chain).await,
            "http://www.example.com/?param1=value"
        );
    }

    #[tokio::test]
    async fn set_query_params_from_map() {
        let mut chain = Chain::new();
        chain.push(url("www.example.com?a=b&z=1"));
        chain.push(set_query_params(BTreeMap::from([("a", "c"), ("b", "d")])));
        assert_eq!(
            url_after(chain).await,
            "http://www.example.com?a=c&z=1&b=d"
        );
    }

    #[tokio::test]
    async fn empty_params_leave_url_untouched() {
        let mut chain = Chain::new();
        chain.push(url(""));
        chain.push(set_query_params(BTreeMap::<String, String>::new()));
        assert_eq!(url_after(chain).await, "http://");
    }

    #[tokio::test]
    async fn serializable_query() {
        #[derive(Serialize)]
        struct Search {
            q: String,
            tags: Vec<&'static str>,
            page: Option<u32>,
        }

        let mut chain = Chain::new();
        chain.push(url("https://example.com/search"));
        chain.push(query(Search {
            q: "rust lang".to_string(),
            tags: vec!["a", "b"],
            page: None,
        }));
        assert_eq!(
            url_after(chain).await,
            "https://example.com/search?q=rust+lang&tags=a&tags=b"
        );
    }
}

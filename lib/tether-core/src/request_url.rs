//! Request URL under construction.
//!
//! Middleware build the URL piece by piece (base URL, path, query...) in any
//! order, so intermediate states such as "a path but no host yet" must be
//! representable. [`RequestUrl`] keeps each component separately and is only
//! turned into a strict [`url::Url`] by the transport.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::form_urlencoded;

use crate::Result;

/// Characters escaped when substituting a path parameter.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A possibly partial URL: every component may be empty.
///
/// The query keeps the text it was parsed from: only pairs added or replaced
/// through [`append_query`](Self::append_query) and
/// [`set_query`](Self::set_query) are form-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestUrl {
    scheme: String,
    host: String,
    path: String,
    query: Vec<QueryPair>,
    fragment: Option<String>,
}

/// One `&`-separated query segment: decoded key and value plus the text sent.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryPair {
    key: String,
    value: String,
    raw: String,
}

impl QueryPair {
    fn parse(raw: &str) -> Self {
        let (key, value) = form_urlencoded::parse(raw.as_bytes())
            .next()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .unwrap_or_default();
        Self {
            key,
            value,
            raw: raw.to_string(),
        }
    }

    fn encoded(key: String, value: String) -> Self {
        let raw = form_urlencoded::Serializer::new(String::new())
            .append_pair(&key, &value)
            .finish();
        Self { key, value, raw }
    }
}

impl RequestUrl {
    /// Split a raw URL into its components without validating it.
    ///
    /// Input without `://` is treated as a path (plus query and fragment).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (scheme, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => (scheme.to_string(), rest),
            None => (String::new(), raw),
        };
        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, parse_query(query)),
            None => (rest, Vec::new()),
        };
        let (host, path) = if scheme.is_empty() {
            (String::new(), rest.to_string())
        } else {
            match rest.find('/') {
                Some(idx) => {
                    let (host, path) = rest.split_at(idx);
                    (host.to_string(), path.to_string())
                }
                None => (rest.to_string(), String::new()),
            }
        };

        Self {
            scheme,
            host,
            path,
            query,
            fragment,
        }
    }

    /// URL scheme, empty when unset.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Authority (`host` or `host:port`), empty when unset.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path as written, empty when unset.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query pairs, in order.
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query
            .iter()
            .map(|pair| (pair.key.as_str(), pair.value.as_str()))
    }

    /// First query value for `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|pair| pair.key == key)
            .map(|pair| pair.value.as_str())
    }

    /// Fragment, without the leading `#`.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Replace the scheme.
    pub fn set_scheme(&mut self, scheme: impl Into<String>) {
        self.scheme = scheme.into();
    }

    /// Replace the authority.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    /// Replace the path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Append a path segment, joining with exactly one `/`.
    ///
    /// An empty segment leaves the path untouched.
    pub fn push_path(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        let base = self.path.trim_end_matches('/');
        let segment = segment.trim_start_matches('/');
        self.path = format!("{base}/{segment}");
    }

    /// Replace every `:key` or `{key}` path segment with the encoded `value`.
    pub fn replace_param(&mut self, key: &str, value: &str) {
        let colon = format!(":{key}");
        let braces = format!("{{{key}}}");
        let encoded = utf8_percent_encode(value, PATH_SEGMENT).to_string();

        self.path = self
            .path
            .split('/')
            .map(|segment| {
                if segment == colon || segment == braces {
                    encoded.as_str()
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/");
    }

    /// Append a query pair, keeping existing pairs with the same key.
    pub fn append_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push(QueryPair::encoded(key.into(), value.into()));
    }

    /// Set a query pair, replacing every existing pair with the same key.
    ///
    /// The first existing pair keeps its position.
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let pair = QueryPair::encoded(key.into(), value.into());
        match self.query.iter().position(|existing| existing.key == pair.key) {
            Some(idx) => {
                let mut seen = 0_usize;
                self.query.retain(|existing| {
                    if existing.key == pair.key {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
                if let Some(slot) = self.query.get_mut(idx) {
                    *slot = pair;
                }
            }
            None => self.query.push(pair),
        }
    }

    /// Remove every query pair with `key`.
    pub fn remove_query(&mut self, key: &str) {
        self.query.retain(|pair| pair.key != key);
    }

    /// Query string as sent, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|pair| pair.raw.as_str())
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Whether scheme and host are both set.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        !self.scheme.is_empty() && !self.host.is_empty()
    }

    /// Validate into a strict [`url::Url`].
    pub fn to_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.to_string()).map_err(Into::into)
    }
}

fn parse_query(query: &str) -> Vec<QueryPair> {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(QueryPair::parse)
        .collect()
}

impl fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.scheme.is_empty() || !self.host.is_empty() {
            write!(f, "//{}", self.host)?;
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query_string())?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl From<&str> for RequestUrl {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<url::Url> for RequestUrl {
    fn from(url: url::Url) -> Self {
        Self::parse(url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_url() {
        let url = RequestUrl::parse("https://example.com:8443/a/b?q=v&q=w#top");
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "example.com:8443");
        assert_eq!(url.path(), "/a/b");
        assert_eq!(url.query_value("q"), Some("v"));
        assert_eq!(url.query_pairs().count(), 2);
        assert_eq!(url.fragment(), Some("top"));
        assert_eq!(url.to_string(), "https://example.com:8443/a/b?q=v&q=w#top");
    }

    #[test]
    fn parse_without_scheme_is_a_path() {
        let url = RequestUrl::parse("/users?page=2");
        assert_eq!(url.scheme(), "");
        assert_eq!(url.host(), "");
        assert_eq!(url.path(), "/users");
        assert_eq!(url.to_string(), "/users?page=2");
    }

    #[test]
    fn empty_url_renders_empty() {
        assert_eq!(RequestUrl::default().to_string(), "");
        assert_eq!(RequestUrl::parse("http://").to_string(), "http://");
    }

    #[test]
    fn push_path_joins_once() {
        let mut url = RequestUrl::parse("http://www.example.com/path/");
        url.push_path("/additional_path");
        assert_eq!(url.to_string(), "http://www.example.com/path/additional_path");

        let mut url = RequestUrl::parse("http://www.example.com");
        url.push_path("users");
        assert_eq!(url.to_string(), "http://www.example.com/users");

        url.push_path("");
        assert_eq!(url.path(), "/users");
    }

    #[test]
    fn replace_param_matches_whole_segments() {
        let mut url = RequestUrl::parse("http://www.example.com/:param1/keep/:param2/:param10");
        url.replace_param("param1", "value");
        assert_eq!(
            url.to_string(),
            "http://www.example.com/value/keep/:param2/:param10"
        );

        let mut url = RequestUrl::parse("http://www.example.com/users/{id}");
        url.replace_param("id", "a b/c");
        assert_eq!(url.path(), "/users/a%20b%2Fc");
    }

    #[test]
    fn set_query_replaces_all_occurrences() {
        let mut url = RequestUrl::parse("http://www.example.com?a=b&x=1&a=c");
        url.set_query("a", "d");
        assert_eq!(url.to_string(), "http://www.example.com?a=d&x=1");

        url.set_query("y", "2");
        assert_eq!(url.query_string(), "a=d&x=1&y=2");
    }

    #[test]
    fn parsed_query_is_rendered_verbatim() {
        let raw = "http://example.com/s?flag&redirect=/home&ids=1,2&q=a%20b&sig=abc~def";
        let url = RequestUrl::parse(raw);
        assert_eq!(url.to_string(), raw);
        assert_eq!(url.query_value("flag"), Some(""));
        assert_eq!(url.query_value("redirect"), Some("/home"));
        assert_eq!(url.query_value("q"), Some("a b"));
    }

    #[test]
    fn edited_pairs_are_encoded_others_untouched() {
        let mut url = RequestUrl::parse("http://example.com?flag&redirect=/home&page=1");
        url.set_query("page", "2");
        url.append_query("next", "/a b");
        assert_eq!(
            url.query_string(),
            "flag&redirect=/home&page=2&next=%2Fa+b"
        );
    }

    #[test]
    fn append_query_keeps_duplicates() {
        let mut url = RequestUrl::parse("http://www.example.com?a=b");
        url.append_query("a", "c");
        assert_eq!(url.to_string(), "http://www.example.com?a=b&a=c");

        url.remove_query("a");
        assert_eq!(url.to_string(), "http://www.example.com");
    }

    #[test]
    fn to_url_requires_scheme() {
        let url = RequestUrl::parse("/relative");
        assert!(url.to_url().is_err());

        let url = RequestUrl::parse("https://example.com");
        assert_eq!(
            url.to_url().expect("absolute").as_str(),
            "https://example.com/"
        );
    }
}

//! Body middleware.
//!
//! Each sets the body and the matching `Content-Type` header.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use tether_core::{ContentType, HttpRequest, Middleware, map_request, to_form, to_json};

fn set_body(request: &mut HttpRequest, body: Bytes, content_type: ContentType) {
    request.set_body(body);
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
}

/// Raw bytes sent as `application/octet-stream`.
pub fn body(bytes: impl Into<Bytes>) -> impl Middleware {
    let bytes = bytes.into();
    map_request(move |request| {
        set_body(request, bytes.clone(), ContentType::OctetStream);
        Ok(())
    })
}

/// UTF-8 text sent as `text/plain`.
pub fn text(text: impl Into<String>) -> impl Middleware {
    let bytes = Bytes::from(text.into());
    map_request(move |request| {
        set_body(request, bytes.clone(), ContentType::PlainText);
        Ok(())
    })
}

/// JSON-encoded value.
///
/// Serialization happens when the request is sent; a failure stops the chain.
pub fn json<T>(value: T) -> impl Middleware
where
    T: Serialize + Send + Sync + 'static,
{
    map_request(move |request| {
        set_body(request, to_json(&value)?, ContentType::Json);
        Ok(())
    })
}

/// Form URL-encoded value.
pub fn form<T>(value: T) -> impl Middleware
where
    T: Serialize + Send + Sync + 'static,
{
    map_request(move |request| {
        set_body(request, to_form(&value)?, ContentType::FormUrlEncoded);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tether_core::Error;

    use super::*;
    use crate::middleware::test_support::apply;

    #[derive(Serialize)]
    struct Login {
        user: &'static str,
        remember: bool,
    }

    #[tokio::test]
    async fn json_body() {
        let request = apply(json(Login {
            user: "ada",
            remember: true,
        }))
        .await
        .expect("apply");

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body().as_ref(), br#"{"user":"ada","remember":true}"#);
    }

    #[tokio::test]
    async fn form_body() {
        let request = apply(form(Login {
            user: "ada lovelace",
            remember: false,
        }))
        .await
        .expect("apply");

        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.body().as_ref(), b"user=ada+lovelace&remember=false");
    }

    #[tokio::test]
    async fn text_and_raw_bodies() {
        let request = apply(text("hello")).await.expect("apply");
        assert_eq!(request.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(request.body().as_ref(), b"hello");

        let request = apply(body(vec![0_u8, 1, 2])).await.expect("apply");
        assert_eq!(request.header("content-type"), Some("application/octet-stream"));
        assert_eq!(request.body().len(), 3);
    }

    #[tokio::test]
    async fn json_failure_stops_the_chain() {
        // non-string keys cannot be JSON object keys
        let value = HashMap::from([((1, 2), "x")]);
        let err = apply(json(value)).await.expect_err("unserializable");
        assert!(matches!(err, Error::JsonSerialization(_)));
    }
}

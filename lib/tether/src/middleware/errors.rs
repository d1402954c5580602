//! Status-checking middleware.

use tether_core::{Error, Middleware, map_response};

/// Turn 4xx and 5xx responses into [`Error::Http`], keeping the body.
///
/// Without it a 404 is a successful call with a 404 status.
pub fn errors() -> impl Middleware {
    map_response(|response| {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let message = status.canonical_reason().unwrap_or("unknown status");
            return Err(Error::http_with_body(
                status.as_u16(),
                message,
                response.into_body(),
            ));
        }
        Ok(response)
    })
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, StatusCode};
    use tether_core::HttpResponse;

    use super::*;
    use crate::middleware::test_support::respond;

    #[tokio::test]
    async fn success_passes_through() {
        let response = respond(errors(), HttpResponse::ok()).await.expect("ok");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn redirect_passes_through() {
        let raw = HttpResponse::new(StatusCode::FOUND, HeaderMap::new(), "");
        assert!(respond(errors(), raw).await.is_ok());
    }

    #[tokio::test]
    async fn client_error_keeps_body() {
        let raw = HttpResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), r#"{"code":"missing"}"#);
        let err = respond(errors(), raw).await.expect_err("404");

        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        let body: serde_json::Value = err.decode_body().expect("body").expect("json");
        assert_eq!(body["code"], "missing");
    }

    #[tokio::test]
    async fn server_error() {
        let raw = HttpResponse::new(StatusCode::BAD_GATEWAY, HeaderMap::new(), "");
        let err = respond(errors(), raw).await.expect_err("502");
        assert!(err.is_server_error());
        assert_eq!(err.to_string(), "HTTP error 502: Bad Gateway");
    }
}

//! Default network transport using hyper-util.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tether_core::{BoxFuture, Error, HttpRequest, HttpResponse, Result, Transport};
use tower_service::Service;
use url::Url;

use crate::config::{TransportConfig, TransportConfigBuilder};
use crate::redirect::CheckRedirect;

/// Pooled HTTP/1.1 + HTTP/2 transport with rustls TLS.
///
/// Follows redirects itself, asking its [`CheckRedirect`] hook before every
/// hop. Cloning is cheap and clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use tether::HyperTransport;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(5))
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

static SHARED: OnceLock<Arc<HyperTransport>> = OnceLock::new();

impl HyperTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool.idle_timeout)
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Process-wide transport used by clients built without one.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Build a hyper request from a tether request.
    fn build_hyper_request(request: &HttpRequest) -> Result<http::Request<Full<Bytes>>> {
        let url = request.url().to_url()?;

        let mut hyper_request = http::Request::builder()
            .method(request.method().clone())
            .uri(url.as_str())
            .body(Full::new(request.body().clone()))
            .map_err(|e| Error::invalid_request(e.to_string()))?;
        *hyper_request.headers_mut() = request.headers().clone();

        Ok(hyper_request)
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let hyper_request = Self::build_hyper_request(request)?;

        let response = tokio::time::timeout(self.config.timeout, self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(map_hyper_error)?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(HttpResponse::new(parts.status, parts.headers, body).with_request(request.clone()))
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut current = request;
        let mut via = Vec::new();

        loop {
            let response = self.send_once(&current).await?;

            let Some(check_redirect) = self.config.redirect.hook() else {
                return Ok(response);
            };
            if !is_redirect(response.status()) {
                return Ok(response);
            }
            let Some(location) = response.header("location") else {
                return Ok(response);
            };

            let base = current.url().to_url()?;
            let target = resolve_redirect_url(&base, location)?;
            let method = redirect_method(response.status(), current.method());

            let mut next = HttpRequest::new(method, target);
            if next.method() == current.method() && !matches!(*next.method(), Method::GET | Method::HEAD) {
                next.set_body(current.body().clone());
            }
            next.set_context(current.context().clone());

            via.push(current);
            check_redirect(&mut next, &via)?;

            tracing::debug!(
                status = %response.status(),
                location = %next.url(),
                hops = via.len(),
                "following redirect"
            );
            current = next;
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    fn round_trip(&self, request: HttpRequest) -> BoxFuture<Result<HttpResponse>> {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}

impl Service<HttpRequest> for HyperTransport {
    type Response = HttpResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        self.round_trip(request)
    }
}

/// Builder for [`HyperTransport`].
#[derive(Debug, Clone, Default)]
pub struct HyperTransportBuilder {
    config: TransportConfigBuilder,
}

impl HyperTransportBuilder {
    /// Set the timeout of one network exchange.
    #[must_use]
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set whether redirects are followed.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config = self.config.follow_redirects(follow);
        self
    }

    /// Follow redirects, consulting `hook` before each one.
    ///
    /// Defaults to [`default_redirect_policy`](crate::redirect::default_redirect_policy).
    #[must_use]
    pub fn check_redirect(mut self, hook: CheckRedirect) -> Self {
        self.config = self.config.check_redirect(hook);
        self
    }

    /// Build the transport.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        HyperTransport::with_config(self.config.build())
    }
}

/// Create an HTTPS connector with rustls and Mozilla roots.
fn https_connector(config: &TransportConfig) -> HttpsConnector<HttpConnector> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

#[allow(clippy::needless_pass_by_value)]
fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
    let msg = err.to_string();

    if err.is_connect() {
        return Error::connection(msg);
    }

    if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
        return Error::tls(msg);
    }

    Error::connection(msg)
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// 307 and 308 keep the method; the others switch to GET (HEAD stays HEAD).
fn redirect_method(status: StatusCode, original: &Method) -> Method {
    match status.as_u16() {
        307 | 308 => original.clone(),
        _ if *original == Method::HEAD => Method::HEAD,
        _ => Method::GET,
    }
}

fn resolve_redirect_url(base_url: &Url, location: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(location) {
        return Ok(url);
    }
    base_url.join(location).map_err(Error::InvalidUrl)
}

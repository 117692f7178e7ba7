//! Hyper-based network transport.

use std::task::{Context, Poll};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use courier_core::{
    BoxFuture, ClientError, RequestConfig, RequestError, RequestHandle, Response, ResponseData,
};
use http::{HeaderMap, HeaderName, HeaderValue, Uri, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::ClientConfig;
use tower_service::Service;

use super::Transport;
use super::body::{ProgressBody, TransportBody};
use super::connector::{build_https_connector, danger_accept_invalid_certs_config, default_tls_config};
use crate::builder::ClientBuildError;
use crate::helpers::{CookieJar, is_same_origin};

/// Type alias for the hyper client with HTTPS connector.
type HyperClient = Client<HttpsConnector<HttpConnector>, ProgressBody<TransportBody>>;

/// Network transport using hyper_util's legacy client.
///
/// Besides the I/O itself it applies the browser-like parts of a request:
/// - the target origin's cookies and the XSRF header for same-origin requests, or for any
///   request when `with_credentials` is set
/// - the `Authorization: Basic` header from `auth`
/// - upload and download progress callbacks
///
/// Transport failures are reported as `Network Error`.
///
/// # Example
///
/// ```ignore
/// use courier_client::{Courier, HyperTransport};
///
/// let transport = HyperTransport::builder().build()?;
/// let client = Courier::with_transport(transport);
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    cookies: CookieJar,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::builder().build()
    }

    /// The cookie jar shared by every request of this transport.
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookies
    }

    /// Execute one prepared request.
    pub async fn execute(&self, config: RequestConfig) -> Result<Response, ClientError> {
        let method = config.method_or_default();
        let url = config.url.clone().unwrap_or_default();
        let uri: Uri = match url.parse() {
            Ok(uri) => uri,
            Err(e) => {
                let request = RequestHandle::from_config(&config);
                return Err(RequestError::new(
                    format!("Invalid URL: {}", url),
                    config,
                    None,
                    request,
                    None,
                )
                .with_source(e)
                .into());
            }
        };

        let mut headers = config.headers.clone().unwrap_or_default();
        let shares_cookies = config.with_credentials.unwrap_or(false)
            || is_same_origin(&url, config.base_url.as_deref());
        if shares_cookies {
            self.apply_xsrf(&config, &url, &mut headers);
            if let Some(cookie) = self.cookies.header_value(&url) {
                headers.insert(header::COOKIE, cookie);
            }
        }
        if let Some(auth) = &config.auth {
            let credentials = BASE64.encode(format!("{}:{}", auth.username, auth.password));
            if let Ok(value) = HeaderValue::from_str(&format!("Basic {}", credentials)) {
                headers.insert(header::AUTHORIZATION, value);
            }
        }

        let handle = RequestHandle::new(method.clone(), uri.clone(), headers.clone());
        let body = match &config.data {
            Some(data) => match data.to_bytes() {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Err(RequestError::new(
                        format!("Failed to encode request body: {}", e),
                        config,
                        None,
                        handle,
                        None,
                    )
                    .with_source(e)
                    .into());
                }
            },
            None => Bytes::new(),
        };

        let mut request = http::Request::new(ProgressBody::new(
            TransportBody::full(body),
            config.on_upload_progress.clone(),
            None,
        ));
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;

        #[cfg(feature = "tracing")]
        tracing::debug!(method = %handle.method, uri = %handle.uri, "sending request");

        let response = match self.client.request(request).await {
            Ok(response) => response,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %e, "request failed");
                return Err(RequestError::network(config, handle).with_source(e).into());
            }
        };

        let (parts, incoming) = response.into_parts();
        if shares_cookies {
            self.cookies.store_from_headers(&url, &parts.headers);
        }

        let total = content_length(&parts.headers);
        let body = ProgressBody::new(incoming, config.on_download_progress.clone(), total);
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return Err(RequestError::network(config, handle).with_source(e).into());
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(status = %parts.status, bytes = bytes.len(), "response received");

        let data = ResponseData::from_body(bytes, config.response_type);
        // hyper only records the reason phrase when it differs from the canonical one.
        let reason = parts
            .extensions
            .get::<::hyper::ext::ReasonPhrase>()
            .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned());
        let response = Response::new(parts.status, parts.headers, data, config, handle);
        Ok(match reason {
            Some(reason) => response.with_status_text(reason),
            None => response,
        })
    }

    /// Copy the XSRF cookie of the page origin (`base_url`, or the target when
    /// there is none) into the XSRF header.
    fn apply_xsrf(&self, config: &RequestConfig, url: &str, headers: &mut HeaderMap) {
        let (Some(cookie_name), Some(header_name)) = (
            config.xsrf_cookie_name.as_deref(),
            config.xsrf_header_name.as_deref(),
        ) else {
            return;
        };
        let origin = config.base_url.as_deref().unwrap_or(url);
        let Some(token) = self.cookies.read(origin, cookie_name) else {
            return;
        };
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(header_name.as_bytes()),
            HeaderValue::from_str(&token),
        ) {
            headers.insert(name, value);
        }
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

impl Transport for HyperTransport {
    fn send(&self, config: RequestConfig) -> BoxFuture<'_, Result<Response, ClientError>> {
        Box::pin(self.execute(config))
    }
}

impl Service<RequestConfig> for HyperTransport {
    type Response = Response;
    type Error = ClientError;
    type Future = BoxFuture<'static, Result<Response, ClientError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // hyper_util legacy::Client is always ready
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, config: RequestConfig) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(config).await })
    }
}

/// Builder for [`HyperTransport`].
///
/// # Example
///
/// ```ignore
/// use courier_client::{CookieJar, HyperTransportBuilder};
///
/// let jar = CookieJar::new();
/// jar.set("http://localhost:3000", "XSRF-TOKEN", "1234abc");
///
/// let transport = HyperTransportBuilder::new()
///     .cookie_jar(jar)
///     .build()?;
/// ```
#[derive(Default)]
pub struct HyperTransportBuilder {
    /// Custom TLS configuration.
    tls_config: Option<ClientConfig>,
    /// Whether to accept invalid certificates (dangerous!).
    danger_accept_invalid_certs: bool,
    cookies: Option<CookieJar>,
}

impl HyperTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom TLS configuration.
    ///
    /// Use this to configure custom root certificates, client certificates for mTLS,
    /// or other TLS settings.
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Accept invalid TLS certificates.
    ///
    /// # Warning
    ///
    /// This is extremely dangerous and should only be used for development/testing!
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.danger_accept_invalid_certs = true;
        self
    }

    /// Share an existing cookie jar instead of starting with an empty one.
    pub fn cookie_jar(mut self, jar: CookieJar) -> Self {
        self.cookies = Some(jar);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HyperTransport, ClientBuildError> {
        let tls_config = if self.danger_accept_invalid_certs {
            danger_accept_invalid_certs_config()?
        } else {
            match self.tls_config {
                Some(config) => config,
                None => default_tls_config()?,
            }
        };

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_timer(TokioTimer::new());
        let client = builder.build(build_https_connector(tls_config));

        Ok(HyperTransport {
            client,
            cookies: self.cookies.unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("tls_config", &self.tls_config.is_some())
            .field("danger_accept_invalid_certs", &self.danger_accept_invalid_certs)
            .field("cookies", &self.cookies.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = HyperTransportBuilder::new();
        assert!(builder.tls_config.is_none());
        assert!(!builder.danger_accept_invalid_certs);
        assert!(builder.cookies.is_none());
    }

    #[test]
    fn test_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        assert_eq!(content_length(&headers), Some(42));
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[tokio::test]
    async fn test_build_shares_cookie_jar() {
        let jar = CookieJar::new();
        let transport = HyperTransportBuilder::new()
            .cookie_jar(jar.clone())
            .build()
            .unwrap();
        jar.set("http://a.test", "a", "b");
        assert_eq!(
            transport.cookie_jar().read("http://a.test", "a").as_deref(),
            Some("b")
        );
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[tokio::test]
    async fn test_invalid_url_is_reported() {
        let transport = HyperTransport::new().unwrap();
        let err = transport
            .execute(RequestConfig::new().url("http://exa mple.com"))
            .await
            .unwrap_err();
        assert!(err.message().unwrap().starts_with("Invalid URL"));
    }

    /// Serve one canned HTTP/1.1 response and return the server's URL.
    async fn serve_raw(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await.unwrap();
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[tokio::test]
    async fn test_status_text_uses_server_reason_phrase() {
        let url = serve_raw(
            "HTTP/1.1 200 Everything Fine\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
        )
        .await;
        let transport = HyperTransport::new().unwrap();
        let response = transport
            .execute(RequestConfig::new().url(url))
            .await
            .unwrap();
        assert_eq!(response.status_text, "Everything Fine");
        assert_eq!(response.text(), "ok");
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[tokio::test]
    async fn test_status_text_falls_back_to_canonical_reason() {
        let url = serve_raw(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let transport = HyperTransport::new().unwrap();
        let response = transport
            .execute(RequestConfig::new().url(url))
            .await
            .unwrap();
        assert_eq!(response.status_text, "Not Found");
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HyperTransport::new().unwrap();
        let err = transport
            .execute(RequestConfig::new().url(format!("http://{}/", addr)))
            .await
            .unwrap_err();
        assert_eq!(err.message(), Some("Network Error"));
        assert_eq!(err.code(), None);
    }
}

//! Client builder.
//!
//! Provides a fluent API for configuring and building a [`Courier`].

use std::sync::Arc;
use std::time::Duration;

use courier_core::{RequestConfig, Response};
use http::{HeaderName, HeaderValue};

use crate::client::Courier;
use crate::helpers::CookieJar;
use crate::interceptor::{Intercept, Interceptors, SharedInterceptor};
use crate::transport::{HyperTransportBuilder, TlsClientConfig, Transport};

/// Builder for creating a [`Courier`].
///
/// Everything set here becomes the instance configuration layer, merged over
/// the library defaults and under each call's configuration.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use courier_client::Courier;
///
/// let client = Courier::builder()
///     .base_url("http://localhost:3000/api")
///     .timeout(Duration::from_secs(5))
///     .header("x-client", "courier")
///     .build()?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    /// Instance configuration layer.
    config: RequestConfig,
    /// Headers validated when building.
    headers: Vec<(String, String)>,
    /// Custom transport replacing the hyper transport.
    transport: Option<Arc<dyn Transport>>,
    /// Options of the hyper transport.
    hyper: HyperTransportBuilder,
    request_interceptors: Vec<SharedInterceptor<RequestConfig>>,
    response_interceptors: Vec<SharedInterceptor<Response>>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("headers", &self.headers)
            .field("transport", &self.transport.is_some())
            .field("hyper", &self.hyper)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing instance configuration.
    ///
    /// Values set through the other builder methods are applied on top.
    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = courier_core::merge(&self.config, &config);
        self
    }

    /// Prefix applied to relative request URLs.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Default timeout of every request. Zero disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Add a header sent with every request.
    ///
    /// Invalid names or values are reported by [`build`](Self::build).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.config.with_credentials = Some(enabled);
        self
    }

    pub fn xsrf_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.config.xsrf_cookie_name = Some(name.into());
        self
    }

    pub fn xsrf_header_name(mut self, name: impl Into<String>) -> Self {
        self.config.xsrf_header_name = Some(name.into());
        self
    }

    /// Use a custom transport instead of the hyper transport.
    ///
    /// The hyper options of this builder are then ignored.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set a custom TLS configuration for the hyper transport.
    pub fn tls_config(mut self, config: TlsClientConfig) -> Self {
        self.hyper = self.hyper.tls_config(config);
        self
    }

    /// Accept invalid TLS certificates.
    ///
    /// # Warning
    ///
    /// This should only be used for development/testing!
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.hyper = self.hyper.danger_accept_invalid_certs();
        self
    }

    /// Share a cookie jar with the hyper transport.
    pub fn cookie_jar(mut self, jar: CookieJar) -> Self {
        self.hyper = self.hyper.cookie_jar(jar);
        self
    }

    /// Register a request interceptor on the built client.
    ///
    /// Request interceptors run in reverse registration order.
    pub fn with_request_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: Intercept<RequestConfig> + 'static,
    {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Register a response interceptor on the built client.
    pub fn with_response_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: Intercept<Response> + 'static,
    {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if a header is invalid or the TLS setup fails.
    pub fn build(self) -> Result<Courier, ClientBuildError> {
        let mut config = self.config;
        for (name, value) in self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientBuildError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| ClientBuildError::InvalidHeader(name.clone()))?;
            config.headers_mut().insert(header_name, header_value);
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(self.hyper.build()?),
        };

        let interceptors = Interceptors::default();
        for interceptor in self.request_interceptors {
            interceptors.request.register_shared(interceptor);
        }
        for interceptor in self.response_interceptors {
            interceptors.response.register_shared(interceptor);
        }

        Ok(Courier::from_parts(config, transport, interceptors))
    }
}

/// Error type for client building failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// TLS could not be configured.
    #[error("failed to configure TLS: {0}")]
    Tls(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{RequestHandle, ResponseData};
    use http::{HeaderMap, StatusCode};

    fn echo_builder() -> ClientBuilder {
        ClientBuilder::new().transport(|config: RequestConfig| async move {
            let request = RequestHandle::from_config(&config);
            Ok::<_, courier_core::ClientError>(Response::new(
                StatusCode::OK,
                HeaderMap::new(),
                ResponseData::Empty,
                config,
                request,
            ))
        })
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::new();
        assert!(builder.transport.is_none());
        assert!(builder.headers.is_empty());
        assert!(builder.config.timeout.is_none());
    }

    #[test]
    fn test_builder_sets_instance_layer() {
        let client = echo_builder()
            .base_url("http://localhost:3000")
            .timeout(Duration::from_secs(30))
            .header("x-client", "courier")
            .with_credentials(true)
            .build()
            .unwrap();

        let defaults = client.defaults();
        assert_eq!(defaults.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(defaults.timeout, Some(Duration::from_secs(30)));
        assert_eq!(defaults.with_credentials, Some(true));
        assert_eq!(defaults.headers.unwrap().get("x-client").unwrap(), "courier");
    }

    #[test]
    fn test_builder_rejects_invalid_header() {
        let err = echo_builder().header("bad header", "v").build().unwrap_err();
        assert!(matches!(err, ClientBuildError::InvalidHeader(name) if name == "bad header"));
    }

    #[test]
    fn test_builder_config_then_setters() {
        let client = echo_builder()
            .config(RequestConfig::new().base_url("http://a").xsrf_cookie_name("C"))
            .base_url("http://b")
            .build()
            .unwrap();
        let defaults = client.defaults();
        assert_eq!(defaults.base_url.as_deref(), Some("http://b"));
        assert_eq!(defaults.xsrf_cookie_name.as_deref(), Some("C"));
    }

    #[test]
    fn test_builder_registers_interceptors() {
        let client = echo_builder()
            .with_request_interceptor(crate::HeaderInterceptor::new("x-a", "1"))
            .with_request_interceptor(crate::HeaderInterceptor::new("x-b", "2"))
            .build()
            .unwrap();
        assert_eq!(client.interceptors().request.len(), 2);
        assert!(client.interceptors().response.is_empty());
    }

    #[cfg(any(feature = "tls-ring", feature = "tls-aws-lc"))]
    #[tokio::test]
    async fn test_builder_build_hyper_transport() {
        assert!(ClientBuilder::new().build().is_ok());
    }
}

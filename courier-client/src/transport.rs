//! Transport boundary.
//!
//! A [`Transport`] turns a prepared [`RequestConfig`] into a [`Response`]. The
//! pipeline hands it a configuration whose `url` is final (base URL applied,
//! query appended) and whose headers are processed; timeouts, cancellation
//! and status validation are enforced around the call, so a transport only
//! performs I/O.
//!
//! Closures implement the trait, which makes it easy to stub:
//!
//! ```ignore
//! use courier_client::{Courier, Response, ResponseData, RequestHandle};
//!
//! let client = Courier::with_transport(|config: RequestConfig| async move {
//!     let request = RequestHandle::from_config(&config);
//!     Ok(Response::new(StatusCode::OK, HeaderMap::new(), ResponseData::Empty, config, request))
//! });
//! ```
//!
//! [`HyperTransport`] is the network implementation:
//!
//! - HTTP/1.1 and HTTP/2 with automatic protocol negotiation
//! - TLS with rustls (feature-gated)
//! - Connection pooling
//! - Cookies, XSRF header, basic auth and progress callbacks
//! - Tower service integration
//!
//! # Feature Flags
//!
//! - `tls` (default) - Enables `tls-ring` + `tls-native-roots` for convenience
//! - `tls-ring` / `tls-aws-lc` - Crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - Root certificates

mod body;
mod connector;
mod hyper;

use std::future::Future;

use courier_core::{BoxFuture, ClientError, RequestConfig, Response};

pub use body::{ProgressBody, TransportBody};
pub use connector::{
    DangerousAcceptAnyCertVerifier, build_https_connector, danger_accept_invalid_certs_config,
    default_tls_config, has_tls_support,
};
pub use self::hyper::{HyperTransport, HyperTransportBuilder};

// Re-export rustls types that users might need for TLS configuration
pub use rustls::ClientConfig as TlsClientConfig;

/// Performs the I/O of one request.
pub trait Transport: Send + Sync {
    fn send(&self, config: RequestConfig) -> BoxFuture<'_, Result<Response, ClientError>>;
}

impl<F, Fut> Transport for F
where
    F: Fn(RequestConfig) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, ClientError>> + Send + 'static,
{
    fn send(&self, config: RequestConfig) -> BoxFuture<'_, Result<Response, ClientError>> {
        Box::pin(self(config))
    }
}

//! An HTTP client built around a request pipeline.
//!
//! Every request goes through the same steps:
//!
//! 1. The call's [`RequestConfig`] is merged over the instance defaults, which
//!    are themselves the library [`defaults`] merged with the instance
//!    configuration.
//! 2. Request interceptors run, most recently registered first.
//! 3. The transport step prepares the URL and headers, checks the cancel
//!    token, calls the [`Transport`] under the configured timeout and validates
//!    the response status.
//! 4. Response interceptors run in registration order.
//!
//! A failure at any step skips the fulfilment handlers that follow and is
//! offered to the next rejection handler, which may recover.
//!
//! ## Features
//!
//! - Layered configuration with per-field merge strategies
//! - Request and response interceptors that can be ejected at any time
//! - Cancellation with [`CancelToken`]
//! - Normalized errors for network failures, timeouts and rejected statuses
//! - A hyper transport with TLS, cookies, XSRF protection, basic auth and
//!   progress callbacks
//!
//! ## Example
//!
//! ```ignore
//! use courier_client::{Courier, RequestConfig};
//!
//! let client = Courier::builder()
//!     .base_url("http://localhost:3000")
//!     .build()?;
//!
//! // Add a header to every request
//! client.interceptors().request.use_fulfilled(|config: RequestConfig| async move {
//!     Ok(config.header("x-requested-by", "courier"))
//! });
//!
//! let response = client
//!     .get("/user", RequestConfig::new().param("id", 12345))
//!     .await?;
//! println!("{:?}", response.data);
//! ```
//!
//! ## Cancellation
//!
//! ```ignore
//! use courier_client::{CancelToken, RequestConfig, is_cancel};
//!
//! let source = CancelToken::source();
//! let request = client.get("/user", RequestConfig::new().cancel_token(source.token()));
//!
//! source.cancel_with("Operation canceled by the user.");
//!
//! match request.await {
//!     Err(err) if is_cancel(&err) => println!("{}", err),
//!     other => println!("{:?}", other),
//! }
//! ```
//!
//! ## Errors
//!
//! A failed request resolves to a [`ClientError`]. Transport failures carry a
//! [`RequestError`] with the effective configuration, the request as sent, an
//! optional code (`ECONNABORTED` for timeouts) and, when the server answered,
//! the response:
//!
//! ```ignore
//! if let Err(err) = client.get("/missing", None).await {
//!     if let Some(response) = err.response() {
//!         println!("{} {:?}", response.status, response.data);
//!     } else {
//!         println!("{}", err);
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `tls` (default) - `tls-ring` + `tls-native-roots`
//! - `tls-ring` / `tls-aws-lc` - Crypto providers
//! - `tls-native-roots` / `tls-webpki-roots` - Root certificates
//! - `tracing` - A `courier.dispatch` span per request and debug events

mod builder;
mod client;
mod dispatch;
pub mod helpers;
pub mod interceptor;
pub mod transport;

pub use builder::{ClientBuildError, ClientBuilder};
pub use client::{Courier, all, spread};

pub use helpers::CookieJar;

pub use interceptor::{
    FnInterceptor, HeaderInterceptor, Intercept, InterceptorId, InterceptorManager, Interceptors,
    SharedInterceptor,
};

// Re-export transport types at the top level for convenience
pub use transport::{HyperTransport, HyperTransportBuilder, TlsClientConfig, Transport};

// Re-export core types that users need
pub use courier_core::{
    BasicAuth, BoxFuture, Cancel, CancelSource, CancelToken, Canceler, ClientError, ErrorKind,
    Params, ProgressEvent, RequestBody, RequestConfig, RequestError, RequestHandle, Response,
    ResponseData, ResponseType, StatusValidator, TIMEOUT_CODE, defaults, is_cancel, merge,
};

// Re-export types users need to build configurations and responses
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};

//! Normalized error types.
//!
//! Every failure a request can end with is a [`ClientError`]:
//! - [`ClientError::Cancelled`]: the request's [`CancelToken`](crate::CancelToken) fired
//! - [`ClientError::Request`]: a [`RequestError`] built from a transport failure
//!   (network failure, timeout, or a status rejected by the validator)
//! - [`ClientError::Interceptor`]: an interceptor handler failed

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::Cancel;
use crate::config::RequestConfig;
use crate::response::{RequestHandle, Response};

/// Error code carried by timeout errors.
pub const TIMEOUT_CODE: &str = "ECONNABORTED";

/// The failure a request settles with.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// The request was cancelled through its cancel token.
    #[error(transparent)]
    Cancelled(#[from] Cancel),

    /// The transport step failed.
    #[error(transparent)]
    Request(Box<RequestError>),

    /// An interceptor handler failed.
    #[error("interceptor error: {0}")]
    Interceptor(String),
}

impl ClientError {
    /// Create an interceptor failure.
    pub fn interceptor<S: Into<String>>(message: S) -> Self {
        ClientError::Interceptor(message.into())
    }

    /// Whether this failure is a cancellation.
    pub fn is_cancel(&self) -> bool {
        matches!(self, ClientError::Cancelled(_))
    }

    pub fn as_cancel(&self) -> Option<&Cancel> {
        match self {
            ClientError::Cancelled(cancel) => Some(cancel),
            _ => None,
        }
    }

    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            ClientError::Request(err) => Some(err),
            _ => None,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> Option<&str> {
        match self {
            ClientError::Cancelled(cancel) => cancel.message(),
            ClientError::Request(err) => Some(err.message()),
            ClientError::Interceptor(msg) => Some(msg),
        }
    }

    /// Get the machine-readable error code, if any.
    pub fn code(&self) -> Option<&str> {
        self.as_request_error().and_then(RequestError::code)
    }

    /// The response attached to a failed status validation.
    pub fn response(&self) -> Option<&Response> {
        self.as_request_error().and_then(RequestError::response)
    }

    /// The effective configuration of the failed request.
    pub fn config(&self) -> Option<&RequestConfig> {
        self.as_request_error().map(RequestError::config)
    }
}

impl From<RequestError> for ClientError {
    fn from(err: RequestError) -> Self {
        ClientError::Request(Box::new(err))
    }
}

/// Returns `true` if `err` is a cancellation rather than a request failure.
///
/// ```
/// use courier_core::{Cancel, ClientError, is_cancel};
///
/// assert!(is_cancel(&ClientError::from(Cancel::new(None))));
/// assert!(!is_cancel(&ClientError::interceptor("boom")));
/// ```
pub fn is_cancel(err: &ClientError) -> bool {
    err.is_cancel()
}

/// What kind of transport failure a [`RequestError`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response.
    Network,
    /// The configured timeout elapsed first.
    Timeout,
    /// The response status was rejected by the validator.
    Status,
    /// Any other failure, such as a body that could not be encoded.
    Other,
}

/// A transport failure, normalized into one shape.
#[derive(Clone)]
pub struct RequestError {
    message: String,
    kind: ErrorKind,
    code: Option<String>,
    config: RequestConfig,
    request: RequestHandle,
    response: Option<Response>,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl RequestError {
    pub fn new<S: Into<String>>(
        message: S,
        config: RequestConfig,
        code: Option<String>,
        request: RequestHandle,
        response: Option<Response>,
    ) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Other,
            code,
            config,
            request,
            response,
            source: None,
        }
    }

    /// The request failed before any response arrived.
    pub fn network(config: RequestConfig, request: RequestHandle) -> Self {
        Self {
            kind: ErrorKind::Network,
            ..Self::new("Network Error", config, None, request, None)
        }
    }

    /// The request exceeded `timeout`.
    ///
    /// Uses the configured `timeout_message` when present.
    pub fn timeout(config: RequestConfig, request: RequestHandle, timeout: Duration) -> Self {
        let message = config
            .timeout_message
            .clone()
            .unwrap_or_else(|| format!("Timeout of {} ms exceeded", timeout.as_millis()));
        Self {
            kind: ErrorKind::Timeout,
            ..Self::new(
                message,
                config,
                Some(TIMEOUT_CODE.to_owned()),
                request,
                None,
            )
        }
    }

    /// The response status was rejected by the status validator.
    pub fn status(response: Response) -> Self {
        let message = format!(
            "Request failed with status code {}",
            response.status.as_u16()
        );
        let config = response.config.clone();
        let request = response.request.clone();
        Self {
            kind: ErrorKind::Status,
            ..Self::new(message, config, None, request, Some(response))
        }
    }

    /// Attach the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// The low-level request as it was handed to the transport.
    pub fn request(&self) -> &RequestHandle {
        &self.request
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

impl fmt::Debug for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestError")
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("request", &self.request)
            .field("status", &self.response.as_ref().map(|r| r.status))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for RequestError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseData;
    use http::{HeaderMap, Method, StatusCode};

    fn handle() -> RequestHandle {
        RequestHandle::new(Method::GET, "http://localhost/x".parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_network_error() {
        let err = RequestError::network(RequestConfig::new(), handle());
        assert_eq!(err.message(), "Network Error");
        assert_eq!(err.code(), None);
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.response().is_none());
    }

    #[test]
    fn test_timeout_error_default_message() {
        let err = RequestError::timeout(
            RequestConfig::new().timeout(Duration::from_millis(50)),
            handle(),
            Duration::from_millis(50),
        );
        assert_eq!(err.code(), Some(TIMEOUT_CODE));
        assert!(err.message().contains("50"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_timeout_error_custom_message() {
        let config = RequestConfig::new().timeout_message("too slow");
        let err = RequestError::timeout(config, handle(), Duration::from_secs(1));
        assert_eq!(err.message(), "too slow");
        assert_eq!(err.code(), Some("ECONNABORTED"));
    }

    #[test]
    fn test_status_error_carries_response() {
        let response = Response::new(
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            ResponseData::Empty,
            RequestConfig::new().url("/missing"),
            handle(),
        );
        let err = ClientError::from(RequestError::status(response));

        assert_eq!(err.message(), Some("Request failed with status code 404"));
        assert_eq!(err.response().unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(err.config().unwrap().url.as_deref(), Some("/missing"));
        assert_eq!(err.code(), None);
        assert!(!err.is_cancel());
    }

    #[test]
    fn test_cancel_is_distinguishable() {
        let err = ClientError::from(Cancel::new(Some("stop".into())));
        assert!(is_cancel(&err));
        assert_eq!(err.message(), Some("stop"));
        assert_eq!(err.to_string(), "request canceled: stop");
        assert!(err.as_request_error().is_none());
    }

    #[test]
    fn test_source_is_exposed() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RequestError::network(RequestConfig::new(), handle()).with_source(io);
        assert_eq!(err.source().unwrap().to_string(), "refused");
    }
}

//! Value types carried by [`RequestConfig`](super::RequestConfig) fields.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

/// A request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// UTF-8 text, sent as-is.
    Text(String),
    /// Raw bytes, sent as-is.
    Bytes(Bytes),
    /// A JSON document, serialized when the request is sent.
    Json(Value),
}

impl RequestBody {
    /// Serialize `value` into a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(RequestBody::Json)
    }

    /// Encode the body into the bytes put on the wire.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        match self {
            RequestBody::Text(text) => Ok(Bytes::from(text.clone())),
            RequestBody::Bytes(bytes) => Ok(bytes.clone()),
            RequestBody::Json(value) => serde_json::to_vec(value).map(Bytes::from),
        }
    }

    /// The content type implied by the body, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Json(_) => Some("application/json;charset=utf-8"),
            RequestBody::Text(_) | RequestBody::Bytes(_) => None,
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_owned())
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(bytes))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

/// How the response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    /// Parse the body as JSON, falling back to text when it is not valid JSON.
    Json,
    /// Decode the body as UTF-8 text (lossy).
    Text,
    /// Keep the raw bytes.
    Bytes,
}

/// Basic-auth credentials, sent as an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Progress of an upload or download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes transferred so far.
    pub loaded: u64,
    /// Total bytes, when known.
    pub total: Option<u64>,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        Self { loaded, total }
    }

    /// Fraction of the transfer completed, when the total is known and non-zero.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.loaded as f64 / total as f64),
            _ => None,
        }
    }
}

/// Callback invoked with upload or download progress.
#[derive(Clone)]
pub struct ProgressHandler(Arc<dyn Fn(ProgressEvent) + Send + Sync>);

impl ProgressHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    pub fn call(&self, event: ProgressEvent) {
        (self.0)(event)
    }
}

impl fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressHandler")
    }
}

/// Predicate deciding whether a response status counts as success.
///
/// The default accepts `200..300`.
#[derive(Clone)]
pub struct StatusValidator(Arc<dyn Fn(StatusCode) -> bool + Send + Sync>);

impl StatusValidator {
    pub fn new<F>(validator: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(validator))
    }

    /// Accept statuses within `range`.
    pub fn range(range: Range<u16>) -> Self {
        Self::new(move |status| range.contains(&status.as_u16()))
    }

    pub fn validate(&self, status: StatusCode) -> bool {
        (self.0)(status)
    }
}

impl Default for StatusValidator {
    fn default() -> Self {
        Self::range(200..300)
    }
}

impl fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StatusValidator")
    }
}

/// Query parameters, stored as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build params from any value serializing to a JSON object.
    ///
    /// Returns `None` when `value` does not serialize to an object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Option<Self> {
        match serde_json::to_value(value).ok()? {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Add a parameter.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Custom serializer turning [`Params`] into a query string (without `?`).
#[derive(Clone)]
pub struct ParamsSerializer(Arc<dyn Fn(&Params) -> String + Send + Sync>);

impl ParamsSerializer {
    pub fn new<F>(serializer: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(serializer))
    }

    pub fn serialize(&self, params: &Params) -> String {
        (self.0)(params)
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamsSerializer")
    }
}

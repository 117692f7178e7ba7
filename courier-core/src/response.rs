//! Response and request-handle types.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{RequestConfig, ResponseType};

/// The low-level request as it was sent by the transport.
#[derive(Clone, Debug)]
pub struct RequestHandle {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestHandle {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// The request a configuration describes, for failures raised before the
    /// transport reports what it actually sent.
    ///
    /// An unparsable URL yields the default URI.
    pub fn from_config(config: &RequestConfig) -> Self {
        let uri = config
            .url
            .as_deref()
            .and_then(|url| url.parse().ok())
            .unwrap_or_default();
        Self::new(
            config.method_or_default(),
            uri,
            config.headers.clone().unwrap_or_default(),
        )
    }
}

/// A decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseData {
    /// The body was empty.
    Empty,
    Text(String),
    Json(Value),
    Bytes(Bytes),
}

impl ResponseData {
    /// Decode a raw body according to the requested [`ResponseType`].
    ///
    /// With `Json` (or no response type) the body is parsed as JSON and kept as
    /// text when parsing fails.
    pub fn from_body(body: Bytes, response_type: Option<ResponseType>) -> Self {
        if body.is_empty() {
            return ResponseData::Empty;
        }
        match response_type {
            Some(ResponseType::Bytes) => ResponseData::Bytes(body),
            Some(ResponseType::Text) => {
                ResponseData::Text(String::from_utf8_lossy(&body).into_owned())
            }
            Some(ResponseType::Json) | None => match serde_json::from_slice(&body) {
                Ok(value) => ResponseData::Json(value),
                Err(_) => ResponseData::Text(String::from_utf8_lossy(&body).into_owned()),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseData::Empty)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// A response delivered by the transport.
#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub data: ResponseData,
    /// The effective configuration of the request.
    pub config: RequestConfig,
    pub request: RequestHandle,
}

impl Response {
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        data: ResponseData,
        config: RequestConfig,
        request: RequestHandle,
    ) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            data,
            config,
            request,
        }
    }

    /// Replace the canonical reason with the one the server sent.
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Decode the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            ResponseData::Empty => serde_json::from_value(Value::Null),
            ResponseData::Json(value) => T::deserialize(value),
            ResponseData::Text(text) => serde_json::from_str(text),
            ResponseData::Bytes(bytes) => serde_json::from_slice(bytes),
        }
    }

    /// The body as text.
    pub fn text(&self) -> String {
        match &self.data {
            ResponseData::Empty => String::new(),
            ResponseData::Json(value) => value.to_string(),
            ResponseData::Text(text) => text.clone(),
            ResponseData::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn response(data: ResponseData) -> Response {
        Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            data,
            RequestConfig::new(),
            RequestHandle::new(Method::GET, Uri::from_static("/"), HeaderMap::new()),
        )
    }

    #[test]
    fn test_from_body_json_fallback_to_text() {
        assert_eq!(
            ResponseData::from_body(Bytes::from_static(b"{\"a\":1}"), None),
            ResponseData::Json(json!({ "a": 1 }))
        );
        assert_eq!(
            ResponseData::from_body(Bytes::from_static(b"hello"), Some(ResponseType::Json)),
            ResponseData::Text("hello".into())
        );
        assert_eq!(
            ResponseData::from_body(Bytes::from_static(b"[1]"), Some(ResponseType::Text)),
            ResponseData::Text("[1]".into())
        );
        assert_eq!(
            ResponseData::from_body(Bytes::new(), Some(ResponseType::Bytes)),
            ResponseData::Empty
        );
    }

    #[test]
    fn test_typed_json() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct User {
            name: String,
        }

        let resp = response(ResponseData::Json(json!({ "name": "fred" })));
        assert_eq!(
            resp.json::<User>().unwrap(),
            User {
                name: "fred".into()
            }
        );
        assert_eq!(resp.status_text, "OK");
        assert_eq!(resp.text(), "{\"name\":\"fred\"}");
    }

    #[test]
    fn test_request_handle_from_config() {
        let config = RequestConfig::new()
            .url("http://localhost/a?b=1")
            .method(Method::POST)
            .header("x-a", "1");
        let handle = RequestHandle::from_config(&config);
        assert_eq!(handle.method, Method::POST);
        assert_eq!(handle.uri.path(), "/a");
        assert_eq!(handle.headers.get("x-a").unwrap(), "1");

        let handle = RequestHandle::from_config(&RequestConfig::new().url("not a url"));
        assert_eq!(handle.method, Method::GET);
        assert_eq!(handle.uri, Uri::default());
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let resp = response(ResponseData::Empty);
        assert_eq!(resp.json::<Option<u32>>().unwrap(), None);
        assert_eq!(resp.text(), "");
    }
}

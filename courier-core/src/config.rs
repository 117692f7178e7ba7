//! Request configuration and the layered merge algorithm.
//!
//! A [`RequestConfig`] is a closed set of typed optional fields. Three layers
//! exist (library [`defaults`], instance configuration, call-site configuration)
//! and are combined with [`merge_layers`] into the effective configuration of a
//! single call.
//!
//! # Example
//!
//! ```
//! use courier_core::{RequestConfig, merge};
//!
//! let base = RequestConfig::new().header("A", "1");
//! let call = RequestConfig::new().header("a", "2");
//!
//! let effective = merge(&base, &call);
//! let headers = effective.headers.unwrap();
//! assert_eq!(headers.len(), 1);
//! assert_eq!(headers.get("a").unwrap(), "2");
//! ```

mod defaults;
mod strategy;
mod types;

use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::cancel::CancelToken;
use strategy::FieldMerge;

pub use defaults::{DEFAULT_ACCEPT, DEFAULT_XSRF_COOKIE_NAME, DEFAULT_XSRF_HEADER_NAME, defaults};
pub use strategy::{DeepMerge, MergeStrategy};
pub use types::{
    BasicAuth, Params, ParamsSerializer, ProgressEvent, ProgressHandler, RequestBody,
    ResponseType, StatusValidator,
};

/// Declares the configuration fields together with their merge strategy.
///
/// This is the field -> strategy table; `merge` is generated from it.
macro_rules! request_config {
    ($(
        $(#[$meta:meta])*
        $field:ident / $variant:ident : $ty:ty => $strategy:ident;
    )*) => {
        /// Configuration of a request.
        ///
        /// Every field is optional; an unset field is absent from the layer and
        /// falls through to lower layers when merged.
        #[derive(Debug, Clone, Default)]
        pub struct RequestConfig {
            $(
                $(#[$meta])*
                pub $field: Option<$ty>,
            )*
        }

        /// Identifies one field of [`RequestConfig`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ConfigField {
            $($variant,)*
        }

        impl ConfigField {
            /// Every configuration field, in declaration order.
            pub const ALL: &'static [ConfigField] = &[$(ConfigField::$variant,)*];

            /// The merge strategy assigned to this field.
            pub const fn strategy(self) -> MergeStrategy {
                match self {
                    $(ConfigField::$variant => MergeStrategy::$strategy,)*
                }
            }

            /// The field name on [`RequestConfig`].
            pub const fn name(self) -> &'static str {
                match self {
                    $(ConfigField::$variant => stringify!($field),)*
                }
            }
        }

        impl RequestConfig {
            /// Whether this layer defines `field`.
            pub fn is_set(&self, field: ConfigField) -> bool {
                match field {
                    $(ConfigField::$variant => self.$field.is_some(),)*
                }
            }
        }

        /// Merge `over` onto `base`, producing a new configuration.
        ///
        /// Each field is combined with the strategy assigned to it. Neither
        /// input is modified and the merge never fails.
        pub fn merge(base: &RequestConfig, over: &RequestConfig) -> RequestConfig {
            RequestConfig {
                $(
                    $field: <strategy::markers::$strategy as FieldMerge<$ty>>::merge_field(
                        &base.$field,
                        &over.$field,
                    ),
                )*
            }
        }
    };
}

request_config! {
    /// Target address, absolute or relative to `base_url`.
    url / Url: String => OverrideOnly;
    /// Prefix applied to relative URLs.
    base_url / BaseUrl: String => OverrideWins;
    /// HTTP method. GET is used when unset.
    method / Method: Method => OverrideWins;
    /// Request body.
    data / Data: RequestBody => OverrideOnly;
    /// Request headers.
    headers / Headers: HeaderMap => DeepMerge;
    /// How to interpret the response body.
    response_type / ResponseType: ResponseType => OverrideWins;
    /// Transport timeout. Zero disables the timeout.
    timeout / Timeout: Duration => OverrideWins;
    /// Message of the timeout error, replacing `Timeout of {ms} ms exceeded`.
    timeout_message / TimeoutMessage: String => OverrideWins;
    /// Send stored cookies (and the XSRF header) with cross-origin requests.
    with_credentials / WithCredentials: bool => OverrideWins;
    xsrf_cookie_name / XsrfCookieName: String => OverrideWins;
    xsrf_header_name / XsrfHeaderName: String => OverrideWins;
    on_upload_progress / OnUploadProgress: ProgressHandler => OverrideOnly;
    on_download_progress / OnDownloadProgress: ProgressHandler => OverrideOnly;
    /// Basic-auth credentials.
    auth / Auth: BasicAuth => OverrideWins;
    /// Decides which statuses resolve rather than fail.
    validate_status / ValidateStatus: StatusValidator => OverrideOnly;
    /// Query parameters appended to the URL.
    params / Params: Params => OverrideOnly;
    params_serializer / ParamsSerializer: ParamsSerializer => OverrideOnly;
    cancel_token / CancelToken: CancelToken => OverrideOnly;
}

/// Merge the three configuration layers: `merge(merge(defaults, instance), call)`.
pub fn merge_layers(
    defaults: &RequestConfig,
    instance: &RequestConfig,
    call: &RequestConfig,
) -> RequestConfig {
    merge(&merge(defaults, instance), call)
}

impl RequestConfig {
    /// Create an empty configuration layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The method to use on the wire, defaulting to GET.
    pub fn method_or_default(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// The status validator in effect, defaulting to `200..300`.
    pub fn status_is_valid(&self, status: StatusCode) -> bool {
        match &self.validate_status {
            Some(validator) => validator.validate(status),
            None => StatusValidator::default().validate(status),
        }
    }

    /// Get a mutable reference to the headers, creating an empty map if unset.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.headers.get_or_insert_with(HeaderMap::new)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn data(mut self, data: impl Into<RequestBody>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a JSON body from any serializable value.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.data = Some(RequestBody::json(value)?);
        Ok(self)
    }

    /// Add a header to this layer.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid. Use
    /// [`try_header`](Self::try_header) for untrusted input.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Debug,
    {
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers_mut().insert(name, value);
        self
    }

    /// Try to add a header to this layer.
    ///
    /// Returns `None` if the header name or value is invalid.
    pub fn try_header<K, V>(mut self, name: K, value: V) -> Option<Self>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let name = name.try_into().ok()?;
        let value = value.try_into().ok()?;
        self.headers_mut().insert(name, value);
        Some(self)
    }

    /// Set all headers of this layer, replacing any existing ones.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_message(mut self, message: impl Into<String>) -> Self {
        self.timeout_message = Some(message.into());
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = Some(enabled);
        self
    }

    pub fn xsrf_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.xsrf_cookie_name = Some(name.into());
        self
    }

    pub fn xsrf_header_name(mut self, name: impl Into<String>) -> Self {
        self.xsrf_header_name = Some(name.into());
        self
    }

    pub fn on_upload_progress<F>(mut self, handler: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.on_upload_progress = Some(ProgressHandler::new(handler));
        self
    }

    pub fn on_download_progress<F>(mut self, handler: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.on_download_progress = Some(ProgressHandler::new(handler));
        self
    }

    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth::new(username, password));
        self
    }

    pub fn validate_status<F>(mut self, validator: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Some(StatusValidator::new(validator));
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Add a single query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let params = self.params.take().unwrap_or_default();
        self.params = Some(params.insert(key, value));
        self
    }

    pub fn params_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        self.params_serializer = Some(ParamsSerializer::new(serializer));
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn test_every_field_has_a_strategy() {
        assert_eq!(ConfigField::ALL.len(), 18);
        assert_eq!(ConfigField::Headers.strategy(), MergeStrategy::DeepMerge);
        assert_eq!(ConfigField::Url.strategy(), MergeStrategy::OverrideOnly);
        assert_eq!(
            ConfigField::ValidateStatus.strategy(),
            MergeStrategy::OverrideOnly
        );
        assert_eq!(ConfigField::Timeout.strategy(), MergeStrategy::OverrideWins);
        assert_eq!(ConfigField::Timeout.name(), "timeout");
        let deep: Vec<_> = ConfigField::ALL
            .iter()
            .filter(|f| f.strategy() == MergeStrategy::DeepMerge)
            .collect();
        assert_eq!(deep, vec![&ConfigField::Headers]);
    }

    #[test]
    fn test_merge_case_insensitive_header_collision() {
        let base = RequestConfig::new().header("A", "1");
        let over = RequestConfig::new().header("a", "2");
        let headers = merge(&base, &over).headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("a").unwrap(), "2");
    }

    #[test]
    fn test_merge_last_defining_layer_wins() {
        let a = RequestConfig::new()
            .timeout(Duration::from_millis(1))
            .base_url("http://a");
        let b = RequestConfig::new().timeout(Duration::from_millis(2));
        let c = RequestConfig::new().with_credentials(true);

        let left = merge(&merge(&a, &b), &c);
        let right = merge(&a, &merge(&b, &c));

        for effective in [&left, &right] {
            assert_eq!(effective.timeout, Some(Duration::from_millis(2)));
            assert_eq!(effective.base_url.as_deref(), Some("http://a"));
            assert_eq!(effective.with_credentials, Some(true));
        }
    }

    #[test]
    fn test_merge_header_union_across_layers() {
        let a = RequestConfig::new().header("x-a", "a").header("x-shared", "a");
        let b = RequestConfig::new().header("x-b", "b").header("X-Shared", "b");
        let c = RequestConfig::new().header("x-c", "c");

        let headers = merge_layers(&a, &b, &c).headers.unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers.get("x-a").unwrap(), "a");
        assert_eq!(headers.get("x-b").unwrap(), "b");
        assert_eq!(headers.get("x-c").unwrap(), "c");
        assert_eq!(headers.get("x-shared").unwrap(), "b");
    }

    #[test]
    fn test_merge_field_absent_everywhere_stays_absent() {
        let effective = merge_layers(&defaults(), &RequestConfig::new(), &RequestConfig::new());
        assert!(effective.method.is_none());
        assert!(effective.data.is_none());
        assert!(effective.cancel_token.is_none());
        assert_eq!(effective.method_or_default(), Method::GET);
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let base = RequestConfig::new().header("x-base", "1");
        let over = RequestConfig::new().header("x-over", "2").url("/x");
        let _ = merge(&base, &over);

        assert_eq!(base.headers.as_ref().unwrap().len(), 1);
        assert!(base.url.is_none());
        assert_eq!(over.headers.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_merge_params_are_not_combined() {
        let base = RequestConfig::new().param("a", 1);
        let over = RequestConfig::new().param("b", 2);
        let params = merge(&base, &over).params.unwrap();
        assert!(params.get("a").is_none());
        assert_eq!(params.get("b"), Some(&Value::from(2)));

        let inherited = merge(&base, &RequestConfig::new()).params.unwrap();
        assert_eq!(inherited.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn test_merge_validator_override() {
        let base = RequestConfig::new();
        let over = RequestConfig::new().validate_status(|s| s.as_u16() < 500);
        let effective = merge(&base, &over);
        assert!(effective.status_is_valid(StatusCode::NOT_FOUND));
        assert!(base.status_is_valid(StatusCode::OK));
        assert!(!base.status_is_valid(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_is_set() {
        let config = RequestConfig::new().url("/x");
        assert!(config.is_set(ConfigField::Url));
        assert!(!config.is_set(ConfigField::Method));
    }

    #[test]
    fn test_try_header_invalid() {
        assert!(RequestConfig::new().try_header("invalid\0name", "v").is_none());
        let config = RequestConfig::new()
            .try_header(header::AUTHORIZATION, "Bearer t")
            .unwrap();
        assert_eq!(
            config.headers.unwrap().get(header::AUTHORIZATION).unwrap(),
            "Bearer t"
        );
    }
}

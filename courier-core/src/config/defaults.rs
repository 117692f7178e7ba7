//! Library-level default configuration.

use http::{HeaderMap, HeaderValue, header};

use super::{RequestConfig, StatusValidator};

/// Default `Accept` header sent with every request.
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Cookie holding the XSRF token.
pub const DEFAULT_XSRF_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Header the XSRF token is copied into.
pub const DEFAULT_XSRF_HEADER_NAME: &str = "X-XSRF-TOKEN";

/// The library defaults layer, the base of every merge.
///
/// Fields not listed here (method, timeout, url, ...) are left unset so that
/// they stay absent unless a later layer defines them.
pub fn defaults() -> RequestConfig {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

    RequestConfig {
        headers: Some(headers),
        xsrf_cookie_name: Some(DEFAULT_XSRF_COOKIE_NAME.to_owned()),
        xsrf_header_name: Some(DEFAULT_XSRF_HEADER_NAME.to_owned()),
        validate_status: Some(StatusValidator::default()),
        ..RequestConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_method_and_timeout_unset() {
        let config = defaults();
        assert!(config.method.is_none());
        assert!(config.timeout.is_none());
        assert!(config.url.is_none());
    }

    #[test]
    fn test_defaults_accept_and_xsrf() {
        let config = defaults();
        assert_eq!(
            config.headers.unwrap().get(header::ACCEPT).unwrap(),
            DEFAULT_ACCEPT
        );
        assert_eq!(config.xsrf_cookie_name.as_deref(), Some("XSRF-TOKEN"));
        assert_eq!(config.xsrf_header_name.as_deref(), Some("X-XSRF-TOKEN"));
    }
}

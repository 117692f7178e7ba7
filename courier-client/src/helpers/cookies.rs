//! In-memory cookie jar.
//!
//! The jar stands in for the cookie store of a browser. Cookies are scoped to
//! the origin (scheme and authority) that set them and are only ever sent back
//! to that origin. The transport consults the jar for same-origin requests, or
//! for any request when `with_credentials` is set.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::{HeaderMap, HeaderValue, Uri, header};

type Cookies = BTreeMap<String, String>;

/// A shared cookie store keyed by origin. Clones share the same cookies.
#[derive(Clone, Debug, Default)]
pub struct CookieJar {
    origins: Arc<Mutex<BTreeMap<String, Cookies>>>,
}

/// The `scheme://authority` origin of an absolute URL, lowercased.
///
/// ```
/// use courier_client::helpers::origin_of;
///
/// assert_eq!(origin_of("HTTP://Example.com:8080/a?b").as_deref(), Some("http://example.com:8080"));
/// assert_eq!(origin_of("/relative"), None);
/// ```
pub fn origin_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let scheme = uri.scheme_str()?;
    let authority = uri.authority()?;
    Some(format!("{}://{}", scheme, authority).to_ascii_lowercase())
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn origins(&self) -> MutexGuard<'_, BTreeMap<String, Cookies>> {
        self.origins.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a cookie for the origin of `url`. Relative URLs are ignored.
    pub fn set(&self, url: &str, name: impl Into<String>, value: impl Into<String>) {
        if let Some(origin) = origin_of(url) {
            self.origins()
                .entry(origin)
                .or_default()
                .insert(name.into(), value.into());
        }
    }

    /// Read a cookie the origin of `url` has set.
    pub fn read(&self, url: &str, name: &str) -> Option<String> {
        let origin = origin_of(url)?;
        self.origins().get(&origin)?.get(name).cloned()
    }

    pub fn remove(&self, url: &str, name: &str) {
        let Some(origin) = origin_of(url) else {
            return;
        };
        let mut origins = self.origins();
        if let Some(cookies) = origins.get_mut(&origin) {
            cookies.remove(name);
            if cookies.is_empty() {
                origins.remove(&origin);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.origins().is_empty()
    }

    /// Store every `Set-Cookie` header of a response from `url`.
    ///
    /// Only the name/value pair is kept; `Max-Age=0` deletes the cookie.
    pub fn store_from_headers(&self, url: &str, headers: &HeaderMap) {
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let mut parts = value.split(';');
            let Some((name, cookie)) = parts.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let expired = parts.any(|attr| {
                attr.split_once('=').is_some_and(|(key, value)| {
                    key.trim().eq_ignore_ascii_case("max-age") && value.trim() == "0"
                })
            });
            if expired {
                self.remove(url, name);
            } else {
                self.set(url, name, cookie.trim());
            }
        }
    }

    /// The `Cookie` header value for the cookies of the origin of `url`, if any.
    pub fn header_value(&self, url: &str) -> Option<HeaderValue> {
        let origin = origin_of(url)?;
        let origins = self.origins();
        let cookies = origins.get(&origin).filter(|cookies| !cookies.is_empty())?;
        let joined = cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "http://a.test:8080";
    const B: &str = "http://b.test";

    #[test]
    fn test_origin_of() {
        assert_eq!(origin_of("http://a.test:8080/x").as_deref(), Some(A));
        assert_eq!(origin_of("https://a.test/").as_deref(), Some("https://a.test"));
        assert_eq!(origin_of("/x"), None);
    }

    #[test]
    fn test_set_and_read() {
        let jar = CookieJar::new();
        assert!(jar.read(A, "XSRF-TOKEN").is_none());
        jar.set(A, "XSRF-TOKEN", "abc");
        assert_eq!(jar.read(&format!("{}/any/path", A), "XSRF-TOKEN").as_deref(), Some("abc"));

        let clone = jar.clone();
        clone.set(A, "a", "b");
        assert_eq!(jar.read(A, "a").as_deref(), Some("b"));

        jar.set("/relative", "ignored", "1");
        assert!(jar.read("/relative", "ignored").is_none());
    }

    #[test]
    fn test_cookies_are_scoped_to_origin() {
        let jar = CookieJar::new();
        jar.set(A, "session", "trusted");
        jar.set(B, "session", "foreign");

        assert_eq!(jar.read(A, "session").as_deref(), Some("trusted"));
        assert_eq!(jar.read(B, "session").as_deref(), Some("foreign"));
        assert!(jar.read("https://a.test:8080", "session").is_none());
        assert_eq!(jar.header_value(A).unwrap(), "session=trusted");
        assert!(jar.header_value("http://c.test").is_none());
    }

    #[test]
    fn test_store_from_headers() {
        let jar = CookieJar::new();
        jar.set(A, "old", "1");

        let mut headers = HeaderMap::new();
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("XSRF-TOKEN-D=1234abc; Path=/; HttpOnly"),
        );
        headers.append(header::SET_COOKIE, HeaderValue::from_static("old=; Max-Age=0"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("garbage"));
        jar.store_from_headers(A, &headers);

        assert_eq!(jar.read(A, "XSRF-TOKEN-D").as_deref(), Some("1234abc"));
        assert!(jar.read(A, "old").is_none());
        assert!(jar.read(A, "garbage").is_none());
        assert!(jar.read(B, "XSRF-TOKEN-D").is_none());
    }

    #[test]
    fn test_header_value() {
        let jar = CookieJar::new();
        assert!(jar.header_value(A).is_none());
        jar.set(A, "b", "2");
        jar.set(A, "a", "1");
        assert_eq!(jar.header_value(A).unwrap(), "a=1; b=2");
    }
}

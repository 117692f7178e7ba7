//! URL helpers.

use courier_core::{Params, ParamsSerializer};
use http::Uri;
use serde_json::{Map, Value};

/// Whether `url` carries its own scheme (`http://...`) or is protocol-relative
/// (`//host/...`).
pub fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    match url.find("://") {
        Some(idx) if idx > 0 => {
            let mut scheme = url[..idx].chars();
            scheme.next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Join `base` and `relative` with exactly one slash between them.
pub fn combine_url(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_owned();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Resolve `url` against `base_url` unless it is already absolute.
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    match base_url {
        Some(base) if !is_absolute_url(url) => combine_url(base, url),
        _ => url.to_owned(),
    }
}

/// Append serialized `params` to `url`.
///
/// Uses `serializer` when given, otherwise the default serializer: `null`
/// values are skipped and the rest is encoded with `serde_qs`. A fragment is
/// dropped when a query is appended, and an existing query is extended with
/// `&`.
pub fn build_url(
    url: &str,
    params: Option<&Params>,
    serializer: Option<&ParamsSerializer>,
) -> Result<String, serde_qs::Error> {
    let Some(params) = params else {
        return Ok(url.to_owned());
    };

    let query = match serializer {
        Some(serializer) => serializer.serialize(params),
        None => serialize_params(params)?,
    };
    if query.is_empty() {
        return Ok(url.to_owned());
    }

    let url = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };
    let separator = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}{}", url, separator, query))
}

fn serialize_params(params: &Params) -> Result<String, serde_qs::Error> {
    let present: Map<String, Value> = params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    // serde_qs renders an empty map as "=".
    if present.is_empty() {
        return Ok(String::new());
    }
    serde_qs::to_string(&present)
}

/// Whether `url` targets the same origin as `origin`.
///
/// Relative URLs are always same-origin. An absolute URL is same-origin when
/// its scheme and authority match those of `origin`.
pub fn is_same_origin(url: &str, origin: Option<&str>) -> bool {
    if !is_absolute_url(url) {
        return true;
    }
    let Some(origin) = origin else {
        return false;
    };
    match (url.parse::<Uri>(), origin.parse::<Uri>()) {
        (Ok(target), Ok(origin)) => {
            target.scheme() == origin.scheme() && target.authority() == origin.authority()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("http://example.com/a"));
        assert!(is_absolute_url("HTTPS://example.com"));
        assert!(is_absolute_url("custom-scheme-v1.0://example.com/"));
        assert!(is_absolute_url("//example.com/a"));
        assert!(!is_absolute_url("/more/get"));
        assert!(!is_absolute_url("more/get"));
        assert!(!is_absolute_url("123://example.com"));
        assert!(!is_absolute_url("/a?next=http://b"));
    }

    #[test]
    fn test_combine_url() {
        assert_eq!(combine_url("http://a.com/", "/users"), "http://a.com/users");
        assert_eq!(combine_url("http://a.com", "users"), "http://a.com/users");
        assert_eq!(combine_url("http://a.com/api", ""), "http://a.com/api");
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url(Some("http://a.com"), "/x"), "http://a.com/x");
        assert_eq!(resolve_url(Some("http://a.com"), "http://b.com/x"), "http://b.com/x");
        assert_eq!(resolve_url(None, "/x"), "/x");
    }

    #[test]
    fn test_build_url_without_params() {
        assert_eq!(build_url("/get", None, None).unwrap(), "/get");
        assert_eq!(build_url("/get", Some(&Params::new()), None).unwrap(), "/get");
    }

    #[test]
    fn test_build_url_only_null_params() {
        let params = Params::new().insert("skip", Value::Null);
        assert_eq!(build_url("/get", Some(&params), None).unwrap(), "/get");
        assert_eq!(
            build_url("/get#top", Some(&params), None).unwrap(),
            "/get#top"
        );
    }

    #[test]
    fn test_build_url_appends_query() {
        let params = Params::new().insert("a", 1).insert("b", "x");
        assert_eq!(build_url("/get", Some(&params), None).unwrap(), "/get?a=1&b=x");
    }

    #[test]
    fn test_build_url_skips_null_and_drops_fragment() {
        let params = Params::new().insert("a", 1).insert("skip", Value::Null);
        assert_eq!(
            build_url("/get?x=0#hash", Some(&params), None).unwrap(),
            "/get?x=0&a=1"
        );
    }

    #[test]
    fn test_build_url_nested_array() {
        let params = Params::new().insert("c", json!([1, 2]));
        let url = build_url("/get", Some(&params), None).unwrap();
        assert!(url.starts_with("/get?c"));
        assert!(url.contains('1') && url.contains('2'));
    }

    #[test]
    fn test_build_url_custom_serializer() {
        let serializer = ParamsSerializer::new(|params| {
            params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(";")
        });
        let params = Params::new().insert("a", 1);
        assert_eq!(
            build_url("/get", Some(&params), Some(&serializer)).unwrap(),
            "/get?a=1"
        );
    }

    #[test]
    fn test_is_same_origin() {
        assert!(is_same_origin("/relative", None));
        assert!(is_same_origin(
            "http://localhost:8080/a",
            Some("http://localhost:8080")
        ));
        assert!(!is_same_origin(
            "http://localhost:8888/a",
            Some("http://localhost:8080")
        ));
        assert!(!is_same_origin(
            "https://localhost:8080/a",
            Some("http://localhost:8080")
        ));
        assert!(!is_same_origin("http://other.com/", None));
    }
}

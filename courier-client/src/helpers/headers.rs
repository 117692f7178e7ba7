//! Body-dependent header processing.

use courier_core::RequestBody;
use http::{HeaderMap, HeaderValue, header};

/// Adjust `headers` for the body about to be sent.
///
/// A JSON body gets `Content-Type: application/json;charset=utf-8` unless a
/// content type is already set. Without a body, any `Content-Type` is removed.
pub fn process_headers(headers: &mut HeaderMap, data: Option<&RequestBody>) {
    match data {
        None => {
            headers.remove(header::CONTENT_TYPE);
        }
        Some(body) => {
            if let Some(content_type) = body.content_type() {
                if !headers.contains_key(header::CONTENT_TYPE) {
                    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                }
            }
        }
    }
}

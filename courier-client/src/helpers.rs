//! Request preparation helpers.
//!
//! - [`url`]: URL combination and query-string building
//! - [`headers`]: Body-dependent header processing
//! - [`cookies`]: The cookie jar backing `with_credentials` and the XSRF header

pub mod cookies;
pub mod headers;
pub mod url;

pub use cookies::{CookieJar, origin_of};
pub use headers::process_headers;
pub use url::{build_url, combine_url, is_absolute_url, is_same_origin, resolve_url};

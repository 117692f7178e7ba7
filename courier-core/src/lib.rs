//! Core pipeline types for courier.
//!
//! This crate provides the pieces of the request pipeline that do not depend on
//! a concrete transport, shared by the client crate (`courier-client`) and by
//! custom transport implementations.
//!
//! ## Modules
//!
//! - [`config`]: The request configuration and the layered merge algorithm
//! - [`cancel`]: One-shot cancellation tokens
//! - [`error`]: Normalized error types
//! - [`response`]: Response and request-handle types

pub mod cancel;
pub mod config;
pub mod error;
pub mod response;

pub use cancel::{Cancel, CancelSource, CancelToken, Canceler};
pub use config::{
    BasicAuth, ConfigField, DeepMerge, MergeStrategy, Params, ParamsSerializer, ProgressEvent,
    ProgressHandler, RequestBody, RequestConfig, ResponseType, StatusValidator, defaults, merge,
    merge_layers,
};
pub use error::{ClientError, ErrorKind, RequestError, TIMEOUT_CODE, is_cancel};
pub use response::{RequestHandle, Response, ResponseData};

/// Type alias for a boxed future returning a result.
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

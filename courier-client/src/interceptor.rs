//! Interceptor registries.
//!
//! Interceptors transform a value flowing through the pipeline (the outgoing
//! [`RequestConfig`] or the incoming [`Response`]) or handle a failure on its
//! way to the caller. Each client owns one registry per direction, see
//! [`Interceptors`].
//!
//! # Example
//!
//! ```ignore
//! use courier_client::{Courier, HeaderInterceptor};
//!
//! let client = Courier::new();
//!
//! // Add a header to every request
//! let auth = client
//!     .interceptors()
//!     .request
//!     .register(HeaderInterceptor::new("authorization", "Bearer token123"));
//!
//! // Observe every response
//! client.interceptors().response.use_fulfilled(|response| async move {
//!     println!("status: {}", response.status);
//!     Ok(response)
//! });
//!
//! client.interceptors().request.eject(auth);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use courier_core::{BoxFuture, ClientError, RequestConfig, Response};
use http::{HeaderName, HeaderValue};

// ============================================================================
// Intercept Trait
// ============================================================================

/// A handler pair for one direction of the pipeline.
///
/// `on_fulfilled` receives the value produced by the previous step and
/// returns the (possibly transformed) value for the next one. `on_rejected`
/// receives the failure of the previous step and may recover by returning a
/// value, or fail again. By default the failure is passed on unchanged.
pub trait Intercept<T>: Send + Sync {
    fn on_fulfilled(&self, value: T) -> BoxFuture<'_, Result<T, ClientError>>;

    fn on_rejected(&self, err: ClientError) -> BoxFuture<'_, Result<T, ClientError>> {
        Box::pin(async move { Err(err) })
    }
}

impl<T, I> Intercept<T> for Arc<I>
where
    I: Intercept<T> + ?Sized,
{
    fn on_fulfilled(&self, value: T) -> BoxFuture<'_, Result<T, ClientError>> {
        (**self).on_fulfilled(value)
    }

    fn on_rejected(&self, err: ClientError) -> BoxFuture<'_, Result<T, ClientError>> {
        (**self).on_rejected(err)
    }
}

// ============================================================================
// Closure Interceptor
// ============================================================================

type FulfilledFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;
type RejectedFn<T> =
    Arc<dyn Fn(ClientError) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;

/// Adapts async closures to the [`Intercept`] trait.
///
/// A missing fulfilment handler passes the value through; a missing rejection
/// handler passes the failure through.
///
/// ```ignore
/// use courier_client::FnInterceptor;
///
/// let stamp = FnInterceptor::fulfilled(|config: RequestConfig| async move {
///     Ok(config.header("x-stamp", "1"))
/// })
/// .rejected(|err| async move {
///     eprintln!("request failed: {err}");
///     Err(err)
/// });
/// ```
pub struct FnInterceptor<T> {
    on_fulfilled: Option<FulfilledFn<T>>,
    on_rejected: Option<RejectedFn<T>>,
}

impl<T: Send + 'static> FnInterceptor<T> {
    /// An interceptor that only transforms successful values.
    pub fn fulfilled<F, Fut>(handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self {
            on_fulfilled: Some(Arc::new(
                move |value| -> BoxFuture<'static, Result<T, ClientError>> {
                    Box::pin(handler(value))
                },
            )),
            on_rejected: None,
        }
    }

    /// An interceptor that only handles failures.
    pub fn rejected_only<R, Fut>(handler: R) -> Self
    where
        R: Fn(ClientError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self {
            on_fulfilled: None,
            on_rejected: None,
        }
        .rejected(handler)
    }

    /// Set the failure handler.
    pub fn rejected<R, Fut>(mut self, handler: R) -> Self
    where
        R: Fn(ClientError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        self.on_rejected = Some(Arc::new(
            move |err| -> BoxFuture<'static, Result<T, ClientError>> { Box::pin(handler(err)) },
        ));
        self
    }
}

impl<T> Clone for FnInterceptor<T> {
    fn clone(&self) -> Self {
        Self {
            on_fulfilled: self.on_fulfilled.clone(),
            on_rejected: self.on_rejected.clone(),
        }
    }
}

impl<T> fmt::Debug for FnInterceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("on_fulfilled", &self.on_fulfilled.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .finish()
    }
}

impl<T: Send + 'static> Intercept<T> for FnInterceptor<T> {
    fn on_fulfilled(&self, value: T) -> BoxFuture<'_, Result<T, ClientError>> {
        match &self.on_fulfilled {
            Some(handler) => handler(value),
            None => Box::pin(async move { Ok(value) }),
        }
    }

    fn on_rejected(&self, err: ClientError) -> BoxFuture<'_, Result<T, ClientError>> {
        match &self.on_rejected {
            Some(handler) => handler(err),
            None => Box::pin(async move { Err(err) }),
        }
    }
}

// ============================================================================
// Header Interceptor
// ============================================================================

/// A request interceptor that sets a header on every request.
///
/// ```ignore
/// use courier_client::HeaderInterceptor;
///
/// let auth = HeaderInterceptor::new("authorization", "Bearer token123");
/// client.interceptors().request.register(auth);
/// ```
#[derive(Clone, Debug)]
pub struct HeaderInterceptor {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderInterceptor {
    /// Create a new header interceptor.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.parse().expect("invalid header name"),
            value: value.parse().expect("invalid header value"),
        }
    }

    /// Try to create a new header interceptor, returning an error if invalid.
    pub fn try_new(name: &str, value: &str) -> Result<Self, ClientError> {
        let name = name
            .parse()
            .map_err(|_| ClientError::interceptor(format!("invalid header name: {}", name)))?;
        let value = value
            .parse()
            .map_err(|_| ClientError::interceptor(format!("invalid header value: {}", value)))?;
        Ok(Self { name, value })
    }

    pub fn from_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }
}

impl Intercept<RequestConfig> for HeaderInterceptor {
    fn on_fulfilled(&self, mut config: RequestConfig) -> BoxFuture<'_, Result<RequestConfig, ClientError>> {
        config
            .headers_mut()
            .insert(self.name.clone(), self.value.clone());
        Box::pin(async move { Ok(config) })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Opaque handle returned when registering an interceptor, used to eject it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterceptorId(usize);

/// A registered interceptor.
pub type SharedInterceptor<T> = Arc<dyn Intercept<T>>;

/// An ordered, mutable registry of interceptors for one direction.
///
/// Entries are kept in registration order. Ejecting an entry leaves a
/// tombstone in its slot, so ids stay valid and never shift.
pub struct InterceptorManager<T> {
    slots: Mutex<Vec<Option<SharedInterceptor<T>>>>,
}

impl<T> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }
}

impl<T> InterceptorManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Option<SharedInterceptor<T>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an interceptor, returning its id.
    pub fn register<I>(&self, interceptor: I) -> InterceptorId
    where
        I: Intercept<T> + 'static,
    {
        self.register_shared(Arc::new(interceptor))
    }

    /// Register an already shared interceptor, returning its id.
    pub fn register_shared(&self, interceptor: SharedInterceptor<T>) -> InterceptorId {
        let mut slots = self.slots();
        slots.push(Some(interceptor));
        InterceptorId(slots.len() - 1)
    }

    /// Remove the interceptor registered under `id`.
    ///
    /// Ejecting an unknown or already ejected id does nothing.
    pub fn eject(&self, id: InterceptorId) {
        if let Some(slot) = self.slots().get_mut(id.0) {
            *slot = None;
        }
    }

    /// Visit live interceptors in registration order.
    ///
    /// The registry is not locked while `visitor` runs: interceptors
    /// registered during the walk are visited, and ejecting an entry that was
    /// already visited has no effect on the walk.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&SharedInterceptor<T>),
    {
        let mut index = 0;
        loop {
            let entry = {
                let slots = self.slots();
                match slots.get(index) {
                    Some(slot) => slot.clone(),
                    None => break,
                }
            };
            if let Some(interceptor) = entry {
                visitor(&interceptor);
            }
            index += 1;
        }
    }

    /// Number of live interceptors.
    pub fn len(&self) -> usize {
        self.slots().iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send + 'static> InterceptorManager<T> {
    /// Register an async fulfilment handler.
    pub fn use_fulfilled<F, Fut>(&self, on_fulfilled: F) -> InterceptorId
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        self.register(FnInterceptor::fulfilled(on_fulfilled))
    }

    /// Register a fulfilment and a rejection handler as one entry.
    pub fn use_handlers<F, FFut, R, RFut>(&self, on_fulfilled: F, on_rejected: R) -> InterceptorId
    where
        F: Fn(T) -> FFut + Send + Sync + 'static,
        FFut: Future<Output = Result<T, ClientError>> + Send + 'static,
        R: Fn(ClientError) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        self.register(FnInterceptor::fulfilled(on_fulfilled).rejected(on_rejected))
    }
}

impl<T> fmt::Debug for InterceptorManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorManager")
            .field("len", &self.len())
            .finish()
    }
}

/// The request and response registries of a client.
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorManager<RequestConfig>,
    pub response: InterceptorManager<Response>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }
}

//! The client instance.
//!
//! This module provides [`Courier`], the entry point for making requests, and
//! the free helpers [`all`] and [`spread`].

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use courier_core::{ClientError, RequestBody, RequestConfig, Response, merge};
use http::Method;

use crate::builder::{ClientBuildError, ClientBuilder};
use crate::dispatch::{Chain, prepare};
use crate::interceptor::Interceptors;
use crate::transport::Transport;

/// An HTTP client instance.
///
/// Each instance owns its defaults (the library defaults merged with the
/// instance configuration), one interceptor registry per direction and a
/// transport. Clones share all three.
///
/// # Example
///
/// ```ignore
/// use courier_client::Courier;
///
/// let client = Courier::builder()
///     .base_url("http://localhost:3000")
///     .build()?;
///
/// let response = client.get("/user", None).await?;
/// println!("{}", response.text());
/// ```
#[derive(Clone)]
pub struct Courier {
    inner: Arc<Inner>,
}

struct Inner {
    defaults: RwLock<RequestConfig>,
    interceptors: Interceptors,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Courier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Courier")
            .field("defaults", &self.defaults())
            .field("interceptors", &self.inner.interceptors)
            .finish_non_exhaustive()
    }
}

impl Courier {
    /// Create a client with the hyper transport and no instance configuration.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::builder().build()
    }

    /// Create a client whose instance layer is `config`.
    pub fn create(config: RequestConfig) -> Result<Self, ClientBuildError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self::from_parts(RequestConfig::new(), Arc::new(transport), Interceptors::new())
    }

    pub(crate) fn from_parts(
        config: RequestConfig,
        transport: Arc<dyn Transport>,
        interceptors: Interceptors,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                defaults: RwLock::new(merge(&courier_core::defaults(), &config)),
                interceptors,
                transport,
            }),
        }
    }

    /// The interceptor registries of this instance.
    pub fn interceptors(&self) -> &Interceptors {
        &self.inner.interceptors
    }

    /// A snapshot of the instance defaults.
    pub fn defaults(&self) -> RequestConfig {
        self.inner
            .defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the instance defaults used by subsequent requests.
    ///
    /// ```ignore
    /// client.update_defaults(|defaults| {
    ///     defaults.headers_mut().insert("x-token", HeaderValue::from_static("abc"));
    /// });
    /// ```
    pub fn update_defaults<F>(&self, update: F)
    where
        F: FnOnce(&mut RequestConfig),
    {
        let mut defaults = self
            .inner
            .defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut defaults);
    }

    /// Send a request.
    ///
    /// `config` is merged over the instance defaults, then dispatched through
    /// the interceptor chain and the transport.
    pub async fn request(&self, config: RequestConfig) -> Result<Response, ClientError> {
        let effective = merge(&self.defaults(), &config);
        Chain::build(&self.inner.interceptors, self.inner.transport.as_ref())
            .run(effective)
            .await
    }

    /// The URL a request with `config` would be sent to.
    ///
    /// ```ignore
    /// let uri = client.get_uri(RequestConfig::new().url("/users").param("id", 1))?;
    /// assert_eq!(uri, "http://localhost:3000/users?id=1");
    /// ```
    pub fn get_uri(&self, config: RequestConfig) -> Result<String, ClientError> {
        let prepared = prepare(merge(&self.defaults(), &config))?;
        Ok(prepared.url.unwrap_or_default())
    }

    fn verb(
        &self,
        method: Method,
        url: &str,
        data: Option<RequestBody>,
        config: Option<RequestConfig>,
    ) -> impl Future<Output = Result<Response, ClientError>> + Send + '_ {
        let mut config = config.unwrap_or_default();
        config.method = Some(method);
        config.url = Some(url.to_owned());
        if data.is_some() {
            config.data = data;
        }
        self.request(config)
    }

    pub async fn get(
        &self,
        url: &str,
        config: impl Into<Option<RequestConfig>>,
    ) -> Result<Response, ClientError> {
        self.verb(Method::GET, url, None, config.into()).await
    }

    pub async fn delete(
        &self,
        url: &str,
        config: impl Into<Option<RequestConfig>>,
    ) -> Result<Response, ClientError> {
        self.verb(Method::DELETE, url, None, config.into()).await
    }

    pub async fn head(
        &self,
        url: &str,
        config: impl Into<Option<RequestConfig>>,
    ) -> Result<Response, ClientError> {
        self.verb(Method::HEAD, url, None, config.into()).await
    }

    pub async fn options(
        &self,
        url: &str,
        config: impl Into<Option<RequestConfig>>,
    ) -> Result<Response, ClientError> {
        self.verb(Method::OPTIONS, url, None, config.into()).await
    }

    /// Send a POST request with `data` as the body.
    pub async fn post(
        &self,
        url: &str,
        data: impl Into<RequestBody>,
        config: impl Into<Option<RequestConfig>>,
    ) -> Result<Response, ClientError> {
        self.verb(Method::POST, url, Some(data.into()), config.into())
            .await
    }

    pub async fn put(
        &self,
        url: &str,
        data: impl Into<RequestBody>,
        config: impl Into<Option<RequestConfig>>,
    ) -> Result<Response, ClientError> {
        self.verb(Method::PUT, url, Some(data.into()), config.into())
            .await
    }

    pub async fn patch(
        &self,
        url: &str,
        data: impl Into<RequestBody>,
        config: impl Into<Option<RequestConfig>>,
    ) -> Result<Response, ClientError> {
        self.verb(Method::PATCH, url, Some(data.into()), config.into())
            .await
    }
}

/// Wait for every request, failing with the first failure.
///
/// ```ignore
/// let responses = courier_client::all([
///     client.get("/user", None),
///     client.get("/orders", None),
/// ])
/// .await?;
/// ```
pub async fn all<I, F, T>(requests: I) -> Result<Vec<T>, ClientError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, ClientError>>,
{
    futures::future::try_join_all(requests).await
}

/// Adapt a function over a fixed number of values to take the results of
/// [`all`].
///
/// The adapted function returns `None` when the number of values does not
/// match.
///
/// ```
/// use courier_client::spread;
///
/// let sum = spread(|[a, b]: [i32; 2]| a + b);
/// assert_eq!(sum(vec![1, 2]), Some(3));
///
/// let sum = spread(|[a, b]: [i32; 2]| a + b);
/// assert_eq!(sum(vec![1]), None);
/// ```
pub fn spread<T, R, F, const N: usize>(f: F) -> impl FnOnce(Vec<T>) -> Option<R>
where
    F: FnOnce([T; N]) -> R,
{
    move |values: Vec<T>| <[T; N]>::try_from(values).ok().map(f)
}

//! Request dispatch.
//!
//! One dispatch runs the chain
//!
//! ```text
//! request interceptors (newest first) -> transport step -> response interceptors (oldest first)
//! ```
//!
//! The chain is snapshotted from the registries before it runs, then folded
//! step by step: a successful value goes to the next `on_fulfilled`, a failure
//! to the next `on_rejected`, which may recover. The transport step only runs
//! when the request phase ends with a configuration.

use courier_core::{
    ClientError, RequestConfig, RequestError, RequestHandle, Response,
};
use http::HeaderMap;

#[cfg(feature = "tracing")]
use tracing::Instrument;

use crate::helpers::{build_url, process_headers, resolve_url};
use crate::interceptor::{Intercept, Interceptors, SharedInterceptor};
use crate::transport::Transport;

/// The ordered steps of one dispatch.
pub(crate) struct Chain<'a> {
    request: Vec<SharedInterceptor<RequestConfig>>,
    transport: &'a dyn Transport,
    response: Vec<SharedInterceptor<Response>>,
}

impl<'a> Chain<'a> {
    /// Snapshot the registries.
    ///
    /// Request interceptors are unshifted, so the most recently registered one
    /// runs first and the first registered one runs right before the transport.
    pub(crate) fn build(interceptors: &Interceptors, transport: &'a dyn Transport) -> Self {
        let mut request = Vec::new();
        interceptors
            .request
            .for_each(|interceptor| request.insert(0, interceptor.clone()));

        let mut response = Vec::new();
        interceptors
            .response
            .for_each(|interceptor| response.push(interceptor.clone()));

        Self {
            request,
            transport,
            response,
        }
    }

    pub(crate) async fn run(self, config: RequestConfig) -> Result<Response, ClientError> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "courier.dispatch",
            http.method = %config.method_or_default(),
            http.url = config.url.as_deref().unwrap_or_default(),
            otel.kind = "client",
        );

        let fut = async move {
            let mut state = Ok(config);
            for interceptor in &self.request {
                state = settle(&**interceptor, state).await;
            }

            let mut outcome = match state {
                Ok(config) => transport_step(self.transport, config).await,
                Err(err) => Err(err),
            };

            for interceptor in &self.response {
                outcome = settle(&**interceptor, outcome).await;
            }
            outcome
        };

        #[cfg(feature = "tracing")]
        let fut = fut.instrument(span);

        fut.await
    }
}

/// Apply one interceptor to the current state.
async fn settle<T: Send>(
    interceptor: &dyn Intercept<T>,
    state: Result<T, ClientError>,
) -> Result<T, ClientError> {
    match state {
        Ok(value) => interceptor.on_fulfilled(value).await,
        Err(err) => interceptor.on_rejected(err).await,
    }
}

/// Finalize the configuration handed to the transport.
///
/// The URL gets the base URL and the serialized params; the headers are
/// adjusted for the body.
pub(crate) fn prepare(mut config: RequestConfig) -> Result<RequestConfig, ClientError> {
    let url = resolve_url(
        config.base_url.as_deref(),
        config.url.as_deref().unwrap_or_default(),
    );
    let url = match build_url(
        &url,
        config.params.as_ref(),
        config.params_serializer.as_ref(),
    ) {
        Ok(url) => url,
        Err(e) => {
            let request = RequestHandle::from_config(&config);
            return Err(RequestError::new(
                format!("Failed to serialize params: {}", e),
                config,
                None,
                request,
                None,
            )
            .with_source(e)
            .into());
        }
    };
    config.url = Some(url);

    process_headers(
        config.headers.get_or_insert_with(HeaderMap::new),
        config.data.as_ref(),
    );
    Ok(config)
}

/// Run the transport for a configuration that left the request phase.
///
/// The call is skipped when the cancel token already fired, bounded by the
/// configured timeout, abandoned when the token fires mid-flight, and its
/// response is checked against the status validator.
async fn transport_step(
    transport: &dyn Transport,
    config: RequestConfig,
) -> Result<Response, ClientError> {
    let config = prepare(config)?;

    let token = config.cancel_token.clone();
    if let Some(token) = &token {
        if let Err(reason) = token.throw_if_requested() {
            #[cfg(feature = "tracing")]
            tracing::debug!(%reason, "cancelled before transport");
            return Err(reason.into());
        }
    }

    let limit = config.timeout.filter(|timeout| !timeout.is_zero());
    let call = transport.send(config.clone());
    let timed = {
        let config = config.clone();
        async move {
            let Some(limit) = limit else {
                return call.await;
            };
            match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(timeout_ms = limit.as_millis() as u64, "request timed out");
                    let request = RequestHandle::from_config(&config);
                    Err(RequestError::timeout(config, request, limit).into())
                }
            }
        }
    };

    let response = match token {
        Some(token) => {
            tokio::select! {
                biased;
                reason = token.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%reason, "cancelled during transport");
                    return Err(reason.into());
                }
                result = timed => result?,
            }
        }
        None => timed.await?,
    };

    if !config.status_is_valid(response.status) {
        return Err(RequestError::status(response).into());
    }
    Ok(response)
}

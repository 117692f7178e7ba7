//! Body types for the hyper transport.
//!
//! [`TransportBody`] is the outgoing request body. [`ProgressBody`] wraps any
//! body and reports the bytes it yields to a [`ProgressHandler`], which is how
//! upload and download progress are observed.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use courier_core::{ProgressEvent, ProgressHandler};
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

/// A request body held fully in memory.
#[derive(Default)]
pub enum TransportBody {
    #[default]
    Empty,
    Full { data: Option<Bytes> },
}

impl TransportBody {
    pub fn empty() -> Self {
        TransportBody::Empty
    }

    pub fn full(data: Bytes) -> Self {
        if data.is_empty() {
            return TransportBody::Empty;
        }
        TransportBody::Full { data: Some(data) }
    }
}

impl Body for TransportBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            TransportBody::Empty => Poll::Ready(None),
            TransportBody::Full { data } => Poll::Ready(data.take().map(|d| Ok(Frame::data(d)))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            TransportBody::Empty => true,
            TransportBody::Full { data } => data.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            TransportBody::Empty => SizeHint::with_exact(0),
            TransportBody::Full { data } => {
                SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64))
            }
        }
    }
}

impl std::fmt::Debug for TransportBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportBody::Empty => write!(f, "TransportBody::Empty"),
            TransportBody::Full { data } => f
                .debug_struct("TransportBody::Full")
                .field("data_len", &data.as_ref().map(|d| d.len()))
                .finish(),
        }
    }
}

pin_project! {
    /// A body that reports progress as data frames pass through it.
    pub struct ProgressBody<B> {
        #[pin]
        inner: B,
        handler: Option<ProgressHandler>,
        loaded: u64,
        total: Option<u64>,
    }
}

impl<B: Body> ProgressBody<B> {
    /// Wrap `inner`. The total is taken from `total`, or from the exact size
    /// hint of `inner` when not given.
    pub fn new(inner: B, handler: Option<ProgressHandler>, total: Option<u64>) -> Self {
        let total = total.or_else(|| inner.size_hint().exact());
        Self {
            inner,
            handler,
            loaded: 0,
            total,
        }
    }

    /// Bytes yielded so far.
    pub fn loaded(&self) -> u64 {
        self.loaded
    }
}

impl<B> Body for ProgressBody<B>
where
    B: Body,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let frame = match this.inner.poll_frame(cx) {
            Poll::Ready(frame) => frame,
            Poll::Pending => return Poll::Pending,
        };
        if let Some(Ok(frame)) = &frame {
            if let Some(data) = frame.data_ref() {
                *this.loaded += data.remaining() as u64;
                if let Some(handler) = this.handler {
                    handler.call(ProgressEvent::new(*this.loaded, *this.total));
                }
            }
        }
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> std::fmt::Debug for ProgressBody<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBody")
            .field("loaded", &self.loaded)
            .field("total", &self.total)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_empty_body() {
        let body = TransportBody::empty();
        assert!(body.is_end_stream());

        let collected = body.collect().await.unwrap();
        assert!(collected.to_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_full_body() {
        let data = Bytes::from("hello world");
        let body = TransportBody::full(data.clone());
        assert_eq!(body.size_hint().exact(), Some(11));

        let collected = body.collect().await.unwrap();
        assert_eq!(collected.to_bytes(), data);
    }

    #[tokio::test]
    async fn test_progress_body_reports_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let handler = ProgressHandler::new(move |event| sink.lock().unwrap().push(event));

        let body = ProgressBody::new(TransportBody::full(Bytes::from("12345")), Some(handler), None);
        let collected = body.collect().await.unwrap();

        assert_eq!(collected.to_bytes(), Bytes::from("12345"));
        assert_eq!(*events.lock().unwrap(), vec![ProgressEvent::new(5, Some(5))]);
    }

    #[tokio::test]
    async fn test_progress_body_without_handler() {
        let body = ProgressBody::new(TransportBody::full(Bytes::from("abc")), None, Some(10));
        let collected = body.collect().await.unwrap();
        assert_eq!(collected.to_bytes(), Bytes::from("abc"));
    }
}

//! Byte-for-byte relay of an upstream streaming body
//!
//! Chunks are forwarded as they arrive with no buffering or re-framing, so
//! backpressure from the downstream socket reaches the upstream read loop.
//! Dropping the relay (downstream disconnect) drops the upstream body stream,
//! which releases the upstream connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use futures::stream::Stream;

use super::ProxyError;

/// Pass-through stream that counts what it forwards
pub struct RelayStream<S> {
    inner: S,
    label: &'static str,
    chunks: usize,
    bytes: usize,
    finished: bool,
}

impl<S> RelayStream<S> {
    pub fn new(inner: S, label: &'static str) -> Self {
        Self {
            inner,
            label,
            chunks: 0,
            bytes: 0,
            finished: false,
        }
    }
}

impl<S, E> Stream for RelayStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.chunks += 1;
                this.bytes += chunk.len();
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(
                    relay = this.label,
                    chunks = this.chunks,
                    "Upstream stream failed mid-body: {e}"
                );
                this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if !this.finished {
                    this.finished = true;
                    tracing::debug!(
                        relay = this.label,
                        chunks = this.chunks,
                        bytes = this.bytes,
                        "Upstream stream complete"
                    );
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S> Drop for RelayStream<S> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!(
                relay = self.label,
                chunks = self.chunks,
                bytes = self.bytes,
                "Downstream went away before upstream finished, releasing upstream"
            );
        }
    }
}

/// Wrap a successful upstream response as a `text/event-stream` relay
pub fn event_stream_response(
    upstream: reqwest::Response,
    label: &'static str,
) -> Result<Response, ProxyError> {
    let relay = RelayStream::new(Box::pin(upstream.bytes_stream()), label);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(relay))
        .map_err(|e| ProxyError::Internal(format!("Failed to build response: {e}")))
}

//! The transport seam between the call runtime and the actual HTTP/2 stack.
//!
//! `GrpcClient` speaks to the network through the object-safe
//! [`GrpcTransport`] trait, so tests can swap in an in-memory transport and
//! alternative stacks can be plugged in without touching call semantics.
//! The default implementation lives in [`hyper`] behind the
//! `hyper-transport` feature.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::{AbortHandle, BoxStream};
use http::HeaderMap;
use wirekit_core::Trailers;

use crate::error::TransportError;

#[cfg(feature = "hyper-transport")]
pub mod hyper;

/// A complete unary exchange: the collected response body (still framed)
/// and the trailers that carry the gRPC status.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub body: Bytes,
    pub trailers: Trailers,
}

/// An established server-streaming call: the raw byte stream of the
/// response body plus a handle that tears the call down.
pub struct StreamCall {
    pub incoming: BoxStream<'static, Result<Bytes, TransportError>>,
    pub cancel: CancelHandle,
}

/// Cancels an in-flight streaming call. Cloneable, and safe to trigger
/// more than once; every call after the first is a no-op.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    handle: AbortHandle,
}

impl CancelHandle {
    pub fn new(handle: AbortHandle) -> Self {
        Self { handle }
    }

    /// Tear down the underlying call. Returns immediately; the stream ends
    /// on its next poll.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

/// Dispatches framed request bytes over the wire.
///
/// Implementations own connection management, request building, and
/// deadline enforcement for unary calls. They do not interpret frames or
/// trailers beyond collecting them.
pub trait GrpcTransport: Send + Sync {
    /// Send one framed request and collect the entire response, including
    /// trailers. `timeout` bounds the whole exchange.
    fn unary_call(
        &self,
        path: String,
        frame: Bytes,
        timeout: Option<Duration>,
        headers: HeaderMap,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>>;

    /// Send one framed request and open the response body as a byte
    /// stream. Resolves once response headers arrive.
    fn server_stream(
        &self,
        path: String,
        frame: Bytes,
        headers: HeaderMap,
    ) -> BoxFuture<'static, Result<StreamCall, TransportError>>;
}

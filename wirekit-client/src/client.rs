//! The call runtime: unary dispatch and lazy server streaming.
//!
//! [`GrpcClient`] is the handle generated service stubs hold. It owns the
//! transport plus client-wide defaults, and turns every transport or
//! decoding fault into a status-coded failure so callers only ever see the
//! response union.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::Stream;
use http::HeaderMap;
use wirekit_core::{frame, unframe, CallError, Message, Response, StatusCode, Trailers};

use crate::error::TransportError;
use crate::frame::FrameDecoder;
use crate::options::CallOptions;
use crate::transport::{CancelHandle, GrpcTransport, StreamCall};

/// Configures a [`GrpcClient`] before construction.
pub struct GrpcClientBuilder {
    transport: Arc<dyn GrpcTransport>,
    default_timeout: Option<Duration>,
    default_headers: HeaderMap,
}

impl GrpcClientBuilder {
    /// Timeout applied to unary calls that do not set one in their options.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// A header sent with every call. Per-call headers with the same name
    /// take precedence.
    pub fn default_header(
        mut self,
        name: http::HeaderName,
        value: http::HeaderValue,
    ) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    pub fn build(self) -> GrpcClient {
        GrpcClient {
            transport: self.transport,
            default_timeout: self.default_timeout,
            default_headers: self.default_headers,
        }
    }
}

/// A cheaply cloneable handle for issuing calls over one transport.
#[derive(Clone)]
pub struct GrpcClient {
    transport: Arc<dyn GrpcTransport>,
    default_timeout: Option<Duration>,
    default_headers: HeaderMap,
}

impl GrpcClient {
    pub fn new(transport: impl GrpcTransport + 'static) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: impl GrpcTransport + 'static) -> GrpcClientBuilder {
        GrpcClientBuilder {
            transport: Arc::new(transport),
            default_timeout: None,
            default_headers: HeaderMap::new(),
        }
    }

    fn merged_headers(&self, options: &CallOptions) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /// Issue a unary call.
    ///
    /// The request is encoded and framed, the exchange is dispatched, and
    /// the outcome is decided by the `grpc-status` trailer alone: a non-OK
    /// status is a failure no matter what the body holds, and a missing
    /// status maps to `Unknown`.
    pub async fn unary<Req, Res>(
        &self,
        path: &str,
        request: Req,
        options: CallOptions,
    ) -> Response<Res>
    where
        Req: Message,
        Res: Message,
    {
        let framed = frame(&request.encode());
        let timeout = options.timeout.or(self.default_timeout);
        let headers = self.merged_headers(&options);
        tracing::debug!(path, ?timeout, "unary call");

        let outcome = self
            .transport
            .unary_call(path.to_owned(), framed, timeout, headers)
            .await;
        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(path, error = %err, "unary call failed in transport");
                return Response::Failure(err.into());
            }
        };

        match response.trailers.status() {
            Some(StatusCode::Ok) => {
                decode_body(response.body, response.trailers).unwrap_or_else(Response::Failure)
            }
            Some(status) => {
                let message = response.trailers.message().unwrap_or_default().to_owned();
                Response::Failure(CallError::new(status, message).with_trailers(response.trailers))
            }
            None => Response::Failure(
                CallError::new(StatusCode::Unknown, "response carried no grpc-status")
                    .with_trailers(response.trailers),
            ),
        }
    }

    /// Open a server-streaming call.
    ///
    /// Returns immediately; the request is not sent until the stream is
    /// first polled. Each yielded item is one decoded response message, and
    /// any fault ends the stream after a single `Err`.
    pub fn server_stream<Req, Res>(
        &self,
        path: &str,
        request: Req,
        options: CallOptions,
    ) -> MessageStream<Res>
    where
        Req: Message,
        Res: Message,
    {
        let framed = frame(&request.encode());
        let headers = self.merged_headers(&options);
        let transport = Arc::clone(&self.transport);
        let path = path.to_owned();
        tracing::debug!(path, "server stream opened");

        MessageStream::new(Box::pin(async move {
            transport.server_stream(path, framed, headers).await
        }))
    }
}

type IncomingFrames = FrameDecoder<futures::stream::BoxStream<'static, Result<Bytes, TransportError>>>;

enum StreamState {
    Connecting(BoxFuture<'static, Result<StreamCall, TransportError>>),
    Streaming {
        frames: IncomingFrames,
        cancel: CancelHandle,
    },
    Done,
}

/// A lazy stream of decoded server-streaming responses.
///
/// Nothing happens until the first poll; dropping the stream before then
/// never touches the network. After the call is established, [`cancel`]
/// tears it down and subsequent polls yield `None`.
///
/// [`cancel`]: MessageStream::cancel
pub struct MessageStream<Res> {
    state: StreamState,
    _marker: std::marker::PhantomData<fn() -> Res>,
}

impl<Res> MessageStream<Res> {
    fn new(connect: BoxFuture<'static, Result<StreamCall, TransportError>>) -> Self {
        Self {
            state: StreamState::Connecting(connect),
            _marker: std::marker::PhantomData,
        }
    }

    /// Cancel the call. Idempotent and non-blocking; cancelling before the
    /// call is established simply drops the pending request.
    pub fn cancel(&mut self) {
        if let StreamState::Streaming { cancel, .. } = &self.state {
            cancel.cancel();
        }
        self.state = StreamState::Done;
    }
}

impl<Res> Stream for MessageStream<Res>
where
    Res: Message,
{
    type Item = Result<Res, CallError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match &mut self.state {
                StreamState::Connecting(connect) => match connect.as_mut().poll(cx) {
                    Poll::Ready(Ok(call)) => {
                        self.state = StreamState::Streaming {
                            frames: FrameDecoder::new(call.incoming),
                            cancel: call.cancel,
                        };
                    }
                    Poll::Ready(Err(err)) => {
                        self.state = StreamState::Done;
                        return Poll::Ready(Some(Err(err.into())));
                    }
                    Poll::Pending => return Poll::Pending,
                },
                StreamState::Streaming { frames, .. } => {
                    match Pin::new(frames).poll_next(cx) {
                        Poll::Ready(Some(Ok(payload))) => match Res::decode(&payload) {
                            Ok(message) => return Poll::Ready(Some(Ok(message))),
                            Err(err) => {
                                self.state = StreamState::Done;
                                return Poll::Ready(Some(Err(CallError::new(
                                    StatusCode::Internal,
                                    format!("response decode failed: {err}"),
                                ))));
                            }
                        },
                        Poll::Ready(Some(Err(err))) => {
                            self.state = StreamState::Done;
                            return Poll::Ready(Some(Err(err)));
                        }
                        Poll::Ready(None) => {
                            self.state = StreamState::Done;
                            return Poll::Ready(None);
                        }
                        Poll::Pending => return Poll::Pending,
                    }
                }
                StreamState::Done => return Poll::Ready(None),
            }
        }
    }
}

fn decode_body<Res: Message>(mut body: Bytes, trailers: Trailers) -> Result<Response<Res>, CallError> {
    let payload = unframe(&mut body).map_err(|err| {
        CallError::new(StatusCode::Internal, err.to_string()).with_trailers(trailers.clone())
    })?;
    let value = Res::decode(&payload).map_err(|err| {
        CallError::new(
            StatusCode::Internal,
            format!("response decode failed: {err}"),
        )
        .with_trailers(trailers.clone())
    })?;
    Ok(Response::Success { value, trailers })
}

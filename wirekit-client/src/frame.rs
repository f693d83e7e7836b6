//! Incremental frame decoding over a transport byte stream.
//!
//! HTTP/2 delivers the response body in arbitrary chunks, so gRPC frames
//! can arrive split across reads or several per read. [`FrameDecoder`]
//! buffers chunks and yields one complete message payload at a time.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::Stream;
use wirekit_core::{read_frame, CallError, StatusCode};

use crate::error::TransportError;

/// Adapts a stream of raw byte chunks into a stream of unframed message
/// payloads.
///
/// Faults are fatal: a nonzero compression flag, a truncated frame left in
/// the buffer when the body ends, or a transport error all terminate the
/// stream after yielding one `Err`.
pub struct FrameDecoder<S> {
    stream: S,
    buffer: BytesMut,
    finished: bool,
}

impl<S> FrameDecoder<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            finished: false,
        }
    }
}

impl<S> Unpin for FrameDecoder<S> where S: Unpin {}

impl<S> Stream for FrameDecoder<S>
where
    S: Stream<Item = Result<Bytes, TransportError>> + Unpin,
{
    type Item = Result<Bytes, CallError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.finished {
                return Poll::Ready(None);
            }

            // Drain complete frames already buffered before polling for more.
            match read_frame(&mut self.buffer) {
                Ok(Some(payload)) => return Poll::Ready(Some(Ok(payload))),
                Ok(None) => {}
                Err(err) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(CallError::new(
                        StatusCode::Internal,
                        err.to_string(),
                    ))));
                }
            }

            match Pin::new(&mut self.stream).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    self.buffer.extend_from_slice(&chunk);
                }
                Poll::Ready(Some(Err(err))) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(err.into())));
                }
                Poll::Ready(None) => {
                    self.finished = true;
                    if self.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Err(CallError::new(
                        StatusCode::Internal,
                        "response body ended inside a frame",
                    ))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream::{self, StreamExt};
    use wirekit_core::frame;

    use super::*;

    fn chunks(parts: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes, TransportError>> {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p))))
    }

    #[tokio::test]
    async fn test_yields_frames_split_across_chunks() {
        // One frame cut mid-header, one frame whole: [0,0,0,0,2,h,i][0,0,0,0,1,x]
        let decoder = FrameDecoder::new(chunks(vec![
            &[0x00, 0x00, 0x00],
            &[0x00, 0x02, b'h', b'i', 0x00, 0x00],
            &[0x00, 0x00, 0x01, b'x'],
        ]));
        let payloads: Vec<_> = decoder.collect().await;

        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].as_ref().unwrap().as_ref(), b"hi");
        assert_eq!(payloads[1].as_ref().unwrap().as_ref(), b"x");
    }

    #[tokio::test]
    async fn test_multiple_frames_in_one_chunk() {
        let mut body = BytesMut::new();
        body.extend_from_slice(&frame(b"one"));
        body.extend_from_slice(&frame(b"two"));
        let body: &'static [u8] = Box::leak(body.to_vec().into_boxed_slice());

        let decoder = FrameDecoder::new(chunks(vec![body]));
        let payloads: Vec<_> = decoder.collect().await;

        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].as_ref().unwrap().as_ref(), b"one");
        assert_eq!(payloads[1].as_ref().unwrap().as_ref(), b"two");
    }

    #[tokio::test]
    async fn test_nonzero_flag_is_fatal() {
        let decoder = FrameDecoder::new(chunks(vec![&[0x01, 0x00, 0x00, 0x00, 0x00]]));
        let payloads: Vec<_> = decoder.collect().await;

        assert_eq!(payloads.len(), 1);
        let err = payloads[0].as_ref().unwrap_err();
        assert_eq!(err.status, StatusCode::Internal);
    }

    #[tokio::test]
    async fn test_truncated_trailing_frame_is_fatal() {
        // Header promises 4 bytes; the body ends after 1.
        let decoder = FrameDecoder::new(chunks(vec![&[0x00, 0x00, 0x00, 0x00, 0x04, b'a']]));
        let payloads: Vec<_> = decoder.collect().await;

        assert_eq!(payloads.len(), 1);
        let err = payloads[0].as_ref().unwrap_err();
        assert_eq!(err.status, StatusCode::Internal);
        assert!(err.message.contains("ended inside a frame"));
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced_once() {
        let decoder = FrameDecoder::new(stream::iter(vec![
            Ok(frame(b"ok")),
            Err(TransportError::Network("reset".into())),
        ]));
        let payloads: Vec<_> = decoder.collect().await;

        assert_eq!(payloads.len(), 2);
        assert!(payloads[0].is_ok());
        assert_eq!(payloads[1].as_ref().unwrap_err().status, StatusCode::Unknown);
    }
}

//! gRPC length-prefixed message framing.
//!
//! Every message on a gRPC stream is wrapped in a five-byte header: one
//! compression flag byte followed by the payload length as a big-endian
//! `u32`. This crate never compresses, so the flag is always written as 0
//! and any nonzero flag on the inbound side is a fatal framing error.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// Size of the frame header: 1 flag byte + 4 length bytes.
pub const FRAME_HEADER_SIZE: usize = 5;

/// Wrap an encoded message in a gRPC frame.
pub fn frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.put_u8(0);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Unwrap exactly one frame from the front of `buf`, returning the payload.
///
/// Fails if the header is incomplete, the compression flag is set, or the
/// declared length runs past the end of the buffer. Bytes after the frame
/// are left in place.
pub fn unframe(buf: &mut Bytes) -> Result<Bytes, FrameError> {
    if buf.len() < FRAME_HEADER_SIZE {
        return Err(FrameError::IncompleteHeader(buf.len()));
    }
    let flag = buf[0];
    if flag != 0 {
        return Err(FrameError::UnsupportedFlag(flag));
    }
    let length = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
    let remaining = buf.len() - FRAME_HEADER_SIZE;
    if length as usize > remaining {
        return Err(FrameError::Truncated { length, remaining });
    }
    buf.advance(FRAME_HEADER_SIZE);
    Ok(buf.split_to(length as usize))
}

/// Try to pull one complete frame out of an accumulation buffer.
///
/// Returns `Ok(None)` when the buffer does not yet hold a full frame, so a
/// streaming caller can append more bytes and retry. A nonzero compression
/// flag is reported as soon as the header is visible.
pub fn read_frame(buf: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
    if buf.len() < FRAME_HEADER_SIZE {
        return Ok(None);
    }
    let flag = buf[0];
    if flag != 0 {
        return Err(FrameError::UnsupportedFlag(flag));
    }
    let length = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
    if buf.len() < FRAME_HEADER_SIZE + length {
        return Ok(None);
    }
    buf.advance(FRAME_HEADER_SIZE);
    Ok(Some(buf.split_to(length).freeze()))
}

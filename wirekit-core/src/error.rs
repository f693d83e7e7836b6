//! Decode and framing error types.
//!
//! Both error kinds are fatal to the decode that raised them and are always
//! reported to the caller; the codec never falls back to a default value on
//! malformed input.

use crate::framing::FRAME_HEADER_SIZE;

/// Errors raised while decoding the protobuf wire format.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended in the middle of a varint.
    #[error("truncated varint: buffer exhausted after {0} byte(s)")]
    TruncatedVarint(usize),

    /// A varint ran past the 10-byte maximum without terminating.
    #[error("malformed varint: continuation past 10 bytes")]
    OverlongVarint,

    /// A length prefix or fixed-width read points past the end of the buffer.
    #[error("length {length} exceeds remaining buffer size {remaining}")]
    LengthOverrun { length: u64, remaining: usize },

    /// A tag carried wire type 6 or 7, which are not defined.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),

    /// A tag decoded to field number 0 or one above the 29-bit maximum.
    #[error("invalid field number in tag")]
    InvalidTag,

    /// A string field held bytes that are not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// An end-group tag appeared without a matching start-group.
    #[error("end-group tag without matching start-group")]
    UnexpectedEndGroup,

    /// Group nesting exceeded the skip recursion limit.
    #[error("group nesting exceeds depth limit")]
    GroupDepthExceeded,
}

/// Errors raised while framing or unframing gRPC messages.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than the fixed five-byte frame header.
    #[error("incomplete frame header: expected {FRAME_HEADER_SIZE} bytes, got {0}")]
    IncompleteHeader(usize),

    /// The compression flag byte was nonzero. Compressed frames are
    /// unsupported and this is fatal, never silently tolerated.
    #[error("unsupported frame flag 0x{0:02x}: compression is not supported")]
    UnsupportedFlag(u8),

    /// The declared frame length runs past the available bytes.
    #[error("frame length {length} exceeds remaining {remaining} bytes")]
    Truncated { length: u32, remaining: usize },
}

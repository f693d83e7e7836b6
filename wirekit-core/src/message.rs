//! The encode/decode capability implemented by every generated message type.

use crate::error::DecodeError;
use crate::reader::WireReader;
use crate::writer::WireWriter;

/// A protobuf message that can serialize itself to the binary wire format
/// and reconstruct itself from it.
///
/// Generated code implements [`encode_raw`](Message::encode_raw) and
/// [`decode_from`](Message::decode_from); the byte-level entry points are
/// provided on top of those.
///
/// Decoding accepts fields in any order, lets a later occurrence of a
/// singular field overwrite an earlier one, and silently skips fields the
/// type does not know about.
pub trait Message: Default + Sized {
    /// Append this message's fields to the writer.
    fn encode_raw(&self, writer: &mut WireWriter);

    /// Rebuild a message from a bounded reader, consuming it to the end.
    fn decode_from(reader: &mut WireReader<'_>) -> Result<Self, DecodeError>;

    /// Encode to a fresh byte buffer. A message whose every field holds its
    /// default value encodes to an empty buffer.
    fn encode(&self) -> Vec<u8> {
        let mut writer = WireWriter::new();
        self.encode_raw(&mut writer);
        writer.into_bytes()
    }

    /// Decode from a byte slice.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = WireReader::new(bytes);
        Self::decode_from(&mut reader)
    }
}

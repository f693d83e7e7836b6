//! The encode half of the wire codec.
//!
//! [`WireWriter`] is a sequential, append-only buffer builder. The
//! `write_<type>` methods implement proto3 singular-field semantics: a field
//! equal to its type's zero value is not written at all, so a message whose
//! every field is zero encodes to an empty byte sequence.
//!
//! Generated code uses the low-level primitives (`write_tag`, `write_varint`,
//! `write_fixed32_bits`, `write_fixed64_bits`, `write_len_prefixed`) for the
//! positions where a value must be written unconditionally: repeated
//! elements, populated oneof members and map entries.

use crate::message::Message;
use crate::wire::{tag_key, zigzag_encode32, zigzag_encode64, WireType};

/// Sequential binary buffer builder for the protobuf wire format.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with a pre-allocated buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // ------------------------------------------------------------------
    // Low-level primitives
    // ------------------------------------------------------------------

    /// Emit a field tag: `(field_number << 3) | wire_type`, varint-encoded.
    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
        self.write_varint(tag_key(field_number, wire_type));
    }

    /// Emit a base-128 varint, little-endian groups with a continuation bit.
    pub fn write_varint(&mut self, mut value: u64) {
        loop {
            if value & !0x7F == 0 {
                self.buf.push(value as u8);
                return;
            }
            self.buf.push((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
    }

    /// Emit four raw little-endian bytes.
    pub fn write_fixed32_bits(&mut self, bits: u32) {
        self.buf.extend_from_slice(&bits.to_le_bytes());
    }

    /// Emit eight raw little-endian bytes.
    pub fn write_fixed64_bits(&mut self, bits: u64) {
        self.buf.extend_from_slice(&bits.to_le_bytes());
    }

    /// Emit tag + varint length prefix + raw bytes, unconditionally.
    ///
    /// Used for map entries, which are written even when the entry payload
    /// is empty (an all-default key/value pair).
    pub fn write_len_prefixed(&mut self, field_number: u32, bytes: &[u8]) {
        self.write_tag(field_number, WireType::LengthDelimited);
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    // ------------------------------------------------------------------
    // Singular field writers (zero value omitted)
    // ------------------------------------------------------------------

    /// Write a `double` field unless it is 0.0.
    pub fn write_double(&mut self, field_number: u32, value: f64) {
        if value == 0.0 {
            return;
        }
        self.write_tag(field_number, WireType::Fixed64);
        self.write_fixed64_bits(value.to_bits());
    }

    /// Write a `float` field unless it is 0.0.
    pub fn write_float(&mut self, field_number: u32, value: f32) {
        if value == 0.0 {
            return;
        }
        self.write_tag(field_number, WireType::Fixed32);
        self.write_fixed32_bits(value.to_bits());
    }

    /// Write an `int32` field unless it is 0. Negative values are
    /// sign-extended to 64 bits before varint encoding, per the wire format.
    pub fn write_int32(&mut self, field_number: u32, value: i32) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(value as i64 as u64);
    }

    /// Write an `int64` field unless it is 0.
    pub fn write_int64(&mut self, field_number: u32, value: i64) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(value as u64);
    }

    /// Write a `uint32` field unless it is 0.
    pub fn write_uint32(&mut self, field_number: u32, value: u32) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(value as u64);
    }

    /// Write a `uint64` field unless it is 0.
    pub fn write_uint64(&mut self, field_number: u32, value: u64) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(value);
    }

    /// Write a zigzag-encoded `sint32` field unless it is 0.
    pub fn write_sint32(&mut self, field_number: u32, value: i32) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(zigzag_encode32(value) as u64);
    }

    /// Write a zigzag-encoded `sint64` field unless it is 0.
    pub fn write_sint64(&mut self, field_number: u32, value: i64) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(zigzag_encode64(value));
    }

    /// Write a `fixed32` field unless it is 0.
    pub fn write_fixed32(&mut self, field_number: u32, value: u32) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Fixed32);
        self.write_fixed32_bits(value);
    }

    /// Write a `fixed64` field unless it is 0.
    pub fn write_fixed64(&mut self, field_number: u32, value: u64) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Fixed64);
        self.write_fixed64_bits(value);
    }

    /// Write an `sfixed32` field unless it is 0.
    pub fn write_sfixed32(&mut self, field_number: u32, value: i32) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Fixed32);
        self.write_fixed32_bits(value as u32);
    }

    /// Write an `sfixed64` field unless it is 0.
    pub fn write_sfixed64(&mut self, field_number: u32, value: i64) {
        if value == 0 {
            return;
        }
        self.write_tag(field_number, WireType::Fixed64);
        self.write_fixed64_bits(value as u64);
    }

    /// Write a `bool` field unless it is false.
    pub fn write_bool(&mut self, field_number: u32, value: bool) {
        if !value {
            return;
        }
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(1);
    }

    /// Write a `string` field unless it is empty.
    pub fn write_string(&mut self, field_number: u32, value: &str) {
        if value.is_empty() {
            return;
        }
        self.write_len_prefixed(field_number, value.as_bytes());
    }

    /// Write a `bytes` field unless it is empty.
    pub fn write_bytes(&mut self, field_number: u32, value: &[u8]) {
        if value.is_empty() {
            return;
        }
        self.write_len_prefixed(field_number, value);
    }

    /// Write an enum field by its declared number unless it is 0.
    pub fn write_enum(&mut self, field_number: u32, value: i32) {
        self.write_int32(field_number, value);
    }

    /// Write an embedded message field: the message is encoded recursively
    /// and the byte count of that recursive result is the length prefix.
    /// A message that encodes to zero bytes is omitted entirely.
    pub fn write_message<M: Message>(&mut self, field_number: u32, message: &M) {
        let bytes = message.encode();
        if bytes.is_empty() {
            return;
        }
        self.write_len_prefixed(field_number, &bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_single_byte() {
        let mut w = WireWriter::new();
        w.write_varint(0);
        w.write_varint(1);
        w.write_varint(127);
        assert_eq!(w.as_slice(), &[0x00, 0x01, 0x7F]);
    }

    #[test]
    fn test_varint_multi_byte() {
        let mut w = WireWriter::new();
        w.write_varint(300);
        assert_eq!(w.as_slice(), &[0xAC, 0x02]);

        let mut w = WireWriter::new();
        w.write_varint(u64::MAX);
        assert_eq!(w.len(), 10);
        assert_eq!(w.as_slice()[9], 0x01);
    }

    #[test]
    fn test_tag_encoding() {
        // Field 1, varint -> key 0x08.
        let mut w = WireWriter::new();
        w.write_tag(1, WireType::Varint);
        assert_eq!(w.as_slice(), &[0x08]);

        // Field 16 needs a two-byte key.
        let mut w = WireWriter::new();
        w.write_tag(16, WireType::LengthDelimited);
        assert_eq!(w.as_slice(), &[0x82, 0x01]);
    }

    #[test]
    fn test_zero_values_omitted() {
        let mut w = WireWriter::new();
        w.write_int32(1, 0);
        w.write_int64(2, 0);
        w.write_uint32(3, 0);
        w.write_uint64(4, 0);
        w.write_sint32(5, 0);
        w.write_sint64(6, 0);
        w.write_double(7, 0.0);
        w.write_float(8, 0.0);
        w.write_fixed32(9, 0);
        w.write_fixed64(10, 0);
        w.write_bool(11, false);
        w.write_string(12, "");
        w.write_bytes(13, b"");
        w.write_enum(14, 0);
        assert!(w.is_empty());
    }

    #[test]
    fn test_negative_int32_sign_extended() {
        // int32 -1 occupies the full 10-byte varint.
        let mut w = WireWriter::new();
        w.write_int32(1, -1);
        assert_eq!(w.len(), 11); // 1 tag byte + 10 varint bytes
        assert_eq!(
            &w.as_slice()[1..],
            &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
    }

    #[test]
    fn test_sint32_compact_negative() {
        // zigzag keeps -1 at a single payload byte.
        let mut w = WireWriter::new();
        w.write_sint32(1, -1);
        assert_eq!(w.as_slice(), &[0x08, 0x01]);
    }

    #[test]
    fn test_string_length_prefixed() {
        let mut w = WireWriter::new();
        w.write_string(1, "hi");
        assert_eq!(w.as_slice(), &[0x0A, 0x02, b'h', b'i']);
    }

    #[test]
    fn test_double_little_endian_bits() {
        let mut w = WireWriter::new();
        w.write_double(1, 1.0);
        let mut expected = vec![0x09];
        expected.extend_from_slice(&1.0f64.to_bits().to_le_bytes());
        assert_eq!(w.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_len_prefixed_writes_empty_payload() {
        // Unlike write_bytes, the primitive keeps zero-length payloads.
        let mut w = WireWriter::new();
        w.write_len_prefixed(3, b"");
        assert_eq!(w.as_slice(), &[0x1A, 0x00]);
    }
}

//! The decode half of the wire codec.
//!
//! [`WireReader`] is a sequential cursor over an immutable byte slice. A
//! length-delimited payload is handed out as a bounded sub-reader scoped to
//! exactly that many bytes, so a submessage decode can never read past its
//! own boundary.

use crate::error::DecodeError;
use crate::wire::{split_tag, zigzag_decode32, zigzag_decode64, WireType};

/// Recursion limit for skipping nested groups.
const MAX_GROUP_DEPTH: usize = 64;

/// Sequential cursor over an immutable byte buffer.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader over the full slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of this reader's bound.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Whether the cursor has reached the end of the bound.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::LengthOverrun {
                length: count as u64,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Decode one base-128 varint.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut result = 0u64;
        for (i, shift) in (0..10).map(|i| (i, i * 7)) {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(DecodeError::TruncatedVarint(i));
            };
            self.pos += 1;
            result |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DecodeError::OverlongVarint)
    }

    /// Read the next field tag, or `None` at the end of the buffer.
    pub fn read_tag(&mut self) -> Result<Option<(u32, WireType)>, DecodeError> {
        if self.is_at_end() {
            return Ok(None);
        }
        let key = self.read_varint()?;
        split_tag(key).map(Some)
    }

    // ------------------------------------------------------------------
    // Typed value reads, mirroring the writer's encodings
    // ------------------------------------------------------------------

    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(u64::from_le_bytes(self.take_array()?)))
    }

    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(u32::from_le_bytes(self.take_array()?)))
    }

    pub fn read_int32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_varint()? as i32)
    }

    pub fn read_int64(&mut self) -> Result<i64, DecodeError> {
        Ok(self.read_varint()? as i64)
    }

    pub fn read_uint32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.read_varint()? as u32)
    }

    pub fn read_uint64(&mut self) -> Result<u64, DecodeError> {
        self.read_varint()
    }

    pub fn read_sint32(&mut self) -> Result<i32, DecodeError> {
        Ok(zigzag_decode32(self.read_varint()? as u32))
    }

    pub fn read_sint64(&mut self) -> Result<i64, DecodeError> {
        Ok(zigzag_decode64(self.read_varint()?))
    }

    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_sfixed32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_fixed32()? as i32)
    }

    pub fn read_sfixed64(&mut self) -> Result<i64, DecodeError> {
        Ok(self.read_fixed64()? as i64)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_varint()? != 0)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let bytes = self.read_len_prefixed()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        Ok(self.read_len_prefixed()?.to_vec())
    }

    pub fn read_enum(&mut self) -> Result<i32, DecodeError> {
        self.read_int32()
    }

    /// Read a varint length prefix and borrow that many bytes.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let length = self.read_varint()?;
        let count = usize::try_from(length).map_err(|_| DecodeError::LengthOverrun {
            length,
            remaining: self.remaining(),
        })?;
        if count > self.remaining() {
            return Err(DecodeError::LengthOverrun {
                length,
                remaining: self.remaining(),
            });
        }
        self.take(count)
    }

    /// Read a length-delimited payload as a bounded sub-reader.
    pub fn read_message(&mut self) -> Result<WireReader<'a>, DecodeError> {
        Ok(WireReader::new(self.read_len_prefixed()?))
    }

    /// Discard one field's payload according to its wire type.
    ///
    /// Groups are skipped recursively; start/end markers must balance. An
    /// end-group tag reaching here directly is malformed.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        self.skip_inner(wire_type, 0)
    }

    fn skip_inner(&mut self, wire_type: WireType, depth: usize) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::LengthDelimited => {
                self.read_len_prefixed()?;
            }
            WireType::StartGroup => {
                if depth >= MAX_GROUP_DEPTH {
                    return Err(DecodeError::GroupDepthExceeded);
                }
                loop {
                    match self.read_tag()? {
                        None => return Err(DecodeError::UnexpectedEndGroup),
                        Some((_, WireType::EndGroup)) => break,
                        Some((_, nested)) => self.skip_inner(nested, depth + 1)?,
                    }
                }
            }
            WireType::EndGroup => return Err(DecodeError::UnexpectedEndGroup),
            WireType::Fixed32 => {
                self.take(4)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::WireWriter;

    #[test]
    fn test_read_tag_none_at_end() {
        let mut r = WireReader::new(&[]);
        assert_eq!(r.read_tag().unwrap(), None);
    }

    #[test]
    fn test_read_tag_splits_key() {
        let mut r = WireReader::new(&[0x0A]);
        assert_eq!(r.read_tag().unwrap(), Some((1, WireType::LengthDelimited)));
        assert_eq!(r.read_tag().unwrap(), None);
    }

    #[test]
    fn test_varint_round_trip() {
        for value in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            let mut w = WireWriter::new();
            w.write_varint(value);
            let bytes = w.into_bytes();
            let mut r = WireReader::new(&bytes);
            assert_eq!(r.read_varint().unwrap(), value);
            assert!(r.is_at_end());
        }
    }

    #[test]
    fn test_truncated_varint_errors() {
        // Continuation bit set but the buffer ends.
        let mut r = WireReader::new(&[0x80]);
        assert_eq!(r.read_varint(), Err(DecodeError::TruncatedVarint(1)));
    }

    #[test]
    fn test_overlong_varint_errors() {
        let bytes = [0xFF; 11];
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_varint(), Err(DecodeError::OverlongVarint));
    }

    #[test]
    fn test_length_prefix_past_end_errors() {
        // Declares 5 payload bytes but carries 2.
        let mut r = WireReader::new(&[0x05, b'h', b'i']);
        assert_eq!(
            r.read_len_prefixed(),
            Err(DecodeError::LengthOverrun {
                length: 5,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_fixed_reads_little_endian() {
        let mut w = WireWriter::new();
        w.write_fixed32_bits(0xDEADBEEF);
        w.write_fixed64_bits(0x0123456789ABCDEF);
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_fixed32().unwrap(), 0xDEADBEEF);
        assert_eq!(r.read_fixed64().unwrap(), 0x0123456789ABCDEF);
    }

    #[test]
    fn test_truncated_fixed_errors() {
        let mut r = WireReader::new(&[0x01, 0x02]);
        assert!(matches!(
            r.read_fixed32(),
            Err(DecodeError::LengthOverrun { .. })
        ));
    }

    #[test]
    fn test_sub_reader_is_bounded() {
        // Outer buffer: field payload "ab" then a trailing byte.
        let mut w = WireWriter::new();
        w.write_varint(2);
        let mut bytes = w.into_bytes();
        bytes.extend_from_slice(b"abz");

        let mut r = WireReader::new(&bytes);
        let mut sub = r.read_message().unwrap();
        assert_eq!(sub.remaining(), 2);
        sub.take(2).unwrap();
        assert!(sub.is_at_end());
        // Sub-reader cannot reach the trailing byte.
        assert!(matches!(
            sub.take(1),
            Err(DecodeError::LengthOverrun { .. })
        ));
        // The outer cursor moved past the payload only.
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_skip_every_wire_type() {
        let mut w = WireWriter::new();
        w.write_tag(1, WireType::Varint);
        w.write_varint(300);
        w.write_tag(2, WireType::Fixed64);
        w.write_fixed64_bits(7);
        w.write_len_prefixed(3, b"abc");
        w.write_tag(4, WireType::Fixed32);
        w.write_fixed32_bits(9);
        w.write_tag(5, WireType::Varint);
        w.write_varint(1);
        let bytes = w.into_bytes();

        let mut r = WireReader::new(&bytes);
        while let Some((field, wire)) = r.read_tag().unwrap() {
            if field == 5 {
                assert_eq!(r.read_varint().unwrap(), 1);
            } else {
                r.skip(wire).unwrap();
            }
        }
        assert!(r.is_at_end());
    }

    #[test]
    fn test_skip_balanced_groups() {
        // group 1 { varint field; nested group { fixed32 field } }
        let mut w = WireWriter::new();
        w.write_tag(1, WireType::StartGroup);
        w.write_tag(2, WireType::Varint);
        w.write_varint(5);
        w.write_tag(3, WireType::StartGroup);
        w.write_tag(4, WireType::Fixed32);
        w.write_fixed32_bits(1);
        w.write_tag(3, WireType::EndGroup);
        w.write_tag(1, WireType::EndGroup);
        w.write_tag(6, WireType::Varint);
        w.write_varint(42);
        let bytes = w.into_bytes();

        let mut r = WireReader::new(&bytes);
        let (field, wire) = r.read_tag().unwrap().unwrap();
        assert_eq!(field, 1);
        r.skip(wire).unwrap();
        assert_eq!(r.read_tag().unwrap(), Some((6, WireType::Varint)));
        assert_eq!(r.read_varint().unwrap(), 42);
    }

    #[test]
    fn test_skip_unterminated_group_errors() {
        let mut w = WireWriter::new();
        w.write_tag(1, WireType::StartGroup);
        w.write_tag(2, WireType::Varint);
        w.write_varint(5);
        let bytes = w.into_bytes();

        let mut r = WireReader::new(&bytes);
        let (_, wire) = r.read_tag().unwrap().unwrap();
        assert_eq!(r.skip(wire), Err(DecodeError::UnexpectedEndGroup));
    }

    #[test]
    fn test_bare_end_group_errors() {
        let mut r = WireReader::new(&[]);
        assert_eq!(
            r.skip(WireType::EndGroup),
            Err(DecodeError::UnexpectedEndGroup)
        );
    }

    #[test]
    fn test_invalid_utf8_string_errors() {
        let mut r = WireReader::new(&[0x02, 0xFF, 0xFE]);
        assert_eq!(r.read_string(), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_int32_negative_round_trip() {
        for value in [0, -1, 1, i32::MIN, i32::MAX] {
            let mut w = WireWriter::new();
            w.write_tag(1, WireType::Varint);
            w.write_varint(value as i64 as u64);
            let bytes = w.into_bytes();
            let mut r = WireReader::new(&bytes);
            r.read_tag().unwrap();
            assert_eq!(r.read_int32().unwrap(), value);
        }
    }
}

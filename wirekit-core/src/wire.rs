//! Wire types, field tags and the varint/zigzag primitives.
//!
//! A field tag is a varint-encoded key `(field_number << 3) | wire_type`.
//! The low three bits select how the payload that follows is parsed.

use crate::error::DecodeError;

/// Highest legal field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// The three-bit payload kind carried in every field tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    /// Base-128 varint payload.
    Varint = 0,
    /// Eight raw little-endian bytes.
    Fixed64 = 1,
    /// Varint length prefix followed by that many raw bytes.
    LengthDelimited = 2,
    /// Deprecated group start marker; skippable but never produced.
    StartGroup = 3,
    /// Deprecated group end marker.
    EndGroup = 4,
    /// Four raw little-endian bytes.
    Fixed32 = 5,
}

impl WireType {
    /// Decode the low three bits of a tag. Values 6 and 7 are not defined
    /// and fail the decode.
    pub fn from_value(value: u8) -> Result<WireType, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(DecodeError::InvalidWireType(other)),
        }
    }
}

/// Compute the varint key for a field tag.
pub fn tag_key(field_number: u32, wire_type: WireType) -> u64 {
    ((field_number as u64) << 3) | wire_type as u64
}

/// Split a decoded tag key into field number and wire type.
///
/// Field number 0 and numbers above [`MAX_FIELD_NUMBER`] are rejected.
pub fn split_tag(key: u64) -> Result<(u32, WireType), DecodeError> {
    let wire_type = WireType::from_value((key & 0x7) as u8)?;
    let field_number = u32::try_from(key >> 3).map_err(|_| DecodeError::InvalidTag)?;
    if field_number == 0 || field_number > MAX_FIELD_NUMBER {
        return Err(DecodeError::InvalidTag);
    }
    Ok((field_number, wire_type))
}

/// Zigzag-map a signed 32-bit value so small magnitudes stay small varints.
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zigzag-map a signed 64-bit value.
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_key_round_trip() {
        for (field, wire) in [
            (1, WireType::Varint),
            (2, WireType::LengthDelimited),
            (15, WireType::Fixed64),
            (16, WireType::Fixed32),
            (MAX_FIELD_NUMBER, WireType::Varint),
        ] {
            let key = tag_key(field, wire);
            assert_eq!(split_tag(key).unwrap(), (field, wire));
        }
    }

    #[test]
    fn test_split_tag_rejects_field_zero() {
        assert_eq!(split_tag(0), Err(DecodeError::InvalidTag));
    }

    #[test]
    fn test_split_tag_rejects_invalid_wire_type() {
        assert_eq!(split_tag((1 << 3) | 6), Err(DecodeError::InvalidWireType(6)));
        assert_eq!(split_tag((1 << 3) | 7), Err(DecodeError::InvalidWireType(7)));
    }

    #[test]
    fn test_split_tag_rejects_oversized_field_number() {
        let key = ((MAX_FIELD_NUMBER as u64 + 1) << 3) | WireType::Varint as u64;
        assert_eq!(split_tag(key), Err(DecodeError::InvalidTag));
    }

    #[test]
    fn test_zigzag32() {
        assert_eq!(zigzag_encode32(0), 0);
        assert_eq!(zigzag_encode32(-1), 1);
        assert_eq!(zigzag_encode32(1), 2);
        assert_eq!(zigzag_encode32(-2), 3);
        assert_eq!(zigzag_encode32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag_encode32(i32::MIN), u32::MAX);

        for v in [0, 1, -1, 42, -42, i32::MIN, i32::MAX] {
            assert_eq!(zigzag_decode32(zigzag_encode32(v)), v);
        }
    }

    #[test]
    fn test_zigzag64() {
        assert_eq!(zigzag_encode64(0), 0);
        assert_eq!(zigzag_encode64(-1), 1);
        assert_eq!(zigzag_encode64(i64::MIN), u64::MAX);

        for v in [0, 1, -1, 1 << 40, -(1 << 40), i64::MIN, i64::MAX] {
            assert_eq!(zigzag_decode64(zigzag_encode64(v)), v);
        }
    }
}

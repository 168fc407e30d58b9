//! Low-level protobuf wire format reading and writing.
//!
//! ## Wire Format Overview
//!
//! Each field is encoded as:
//! - A varint "tag" containing the field number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, bool, ...)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages)
//! - 5: I32 (fixed32, sfixed32, float)
//!
//! The deprecated group wire types (3 and 4) and the unassigned values 6 and 7
//! are rejected.

use crate::error::DecodeError;

/// Varints are at most 10 bytes for a 64-bit value
pub const MAX_VARINT_LEN: usize = 10;

/// Protobuf wire types understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// 32-bit fixed-width
    I32 = 5,
}

impl WireType {
    /// Maps the low three bits of a tag to a wire type.
    ///
    /// Returns `None` for group and unassigned wire types.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::I64),
            2 => Some(WireType::Len),
            5 => Some(WireType::I32),
            _ => None,
        }
    }

    /// Human-readable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::I64 => "i64",
            WireType::Len => "len",
            WireType::I32 => "i32",
        }
    }
}

/// Decode a varint from the start of the given bytes.
///
/// Returns the decoded value and the number of bytes consumed. Error offsets
/// are relative to `data`.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), DecodeError> {
    varint_at(data, 0)
}

fn varint_at(data: &[u8], start: usize) -> Result<(u64, usize), DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data[start..].iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(DecodeError::VarintTooLong { offset: start });
        }

        // The tenth byte only has room for bit 63
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(DecodeError::VarintTooLong { offset: start });
        }

        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(DecodeError::TruncatedVarint { offset: start })
}

/// Append `value` to `buf` as a varint.
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Append a field tag to `buf`.
pub fn encode_tag(field_number: u32, wire_type: WireType, buf: &mut Vec<u8>) {
    encode_varint(((field_number as u64) << 3) | wire_type as u64, buf);
}

/// A field tag read from the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Field number (may exceed the valid field range in malformed input)
    pub field_number: u64,
    /// Wire type of the following value
    pub wire_type: WireType,
    /// Offset of the first tag byte
    pub offset: usize,
}

/// Forward-only cursor over a wire-format buffer.
///
/// All error offsets are absolute positions in the buffer the reader was
/// created with. A failed read leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset into the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns true once every byte has been consumed
    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Reads a single varint
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let (value, len) = varint_at(self.data, self.position)?;
        self.position += len;
        Ok(value)
    }

    /// Reads a field tag and splits it into field number and wire type
    pub fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let offset = self.position;
        let (raw, len) = varint_at(self.data, offset)?;

        let bits = (raw & 0x07) as u8;
        let wire_type =
            WireType::from_bits(bits).ok_or(DecodeError::UnsupportedWireType {
                offset,
                wire_type: bits,
            })?;

        self.position += len;
        Ok(Tag {
            field_number: raw >> 3,
            wire_type,
            offset,
        })
    }

    /// Reads exactly `N` bytes
    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let available = self.remaining();
        if available < N {
            return Err(DecodeError::TruncatedFixedWidth {
                offset: self.position,
                needed: N,
                available,
            });
        }

        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.position..self.position + N]);
        self.position += N;
        Ok(out)
    }

    /// Reads a length prefix and returns the payload it covers
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], DecodeError> {
        let (declared, prefix_len) = varint_at(self.data, self.position)?;
        let offset = self.position + prefix_len;
        let available = self.data.len() - offset;

        if declared > available as u64 {
            return Err(DecodeError::TruncatedLengthDelimited {
                offset,
                declared,
                available,
            });
        }

        let end = offset + declared as usize;
        self.position = end;
        Ok(&self.data[offset..end])
    }

    /// Advances past a value of the given wire type without interpreting it
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(drop),
            WireType::I64 => self.read_fixed::<8>().map(drop),
            WireType::Len => self.read_length_delimited().map(drop),
            WireType::I32 => self.read_fixed::<4>().map(drop),
        }
    }
}

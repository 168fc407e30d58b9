//! Schema-guided decoding of wire-format payloads.
//!
//! [`decode`] walks a buffer tag by tag. Fields the chosen [`Message`] does
//! not declare are skipped; declared fields are interpreted from their wire
//! type and declared type:
//!
//! | wire type | declared type | result |
//! |-----------|---------------|--------|
//! | varint    | `bool`        | [`DecodedValue::Bool`] |
//! | varint    | anything else | [`DecodedValue::Int`] (raw, no zig-zag) |
//! | len       | `string`      | [`DecodedValue::String`] |
//! | len       | `bytes`       | [`DecodedValue::Bytes`] |
//! | len       | anything else | [`DecodedValue::Opaque`] (`<Type: N bytes>`) |
//! | i32       | `float`       | [`DecodedValue::Float`] |
//! | i32 / i64 | anything else | [`DecodedValue::Opaque`] (hex) |
//!
//! Any wire-level inconsistency aborts the call with a [`DecodeError`]; no
//! partially decoded mapping is returned.
//!
//! ```
//! use protopeek_core::{decode, extract, DecodedValue};
//!
//! let schema = extract("message M { int32 id = 1; repeated string tag = 2; }")?;
//! let message = schema.message("M").unwrap();
//!
//! let decoded = decode(b"\x08\x05\x12\x01a\x12\x02bb", message)?;
//! assert_eq!(decoded.get("id").unwrap().as_single(), Some(&DecodedValue::Int(5)));
//! # Ok::<(), protopeek_core::Error>(())
//! ```

mod value;

use crate::error::{DecodeError, Error, Result};
use crate::schema::{FieldType, Message};
use crate::wire::{Reader, WireType};
use std::fmt::Write as FmtWrite;
use std::path::Path;
use tracing::{debug, trace};

pub use value::{DecodedEntry, DecodedMessage, DecodedValue};

/// Decodes `buffer` as an instance of `message`
pub fn decode(buffer: &[u8], message: &Message) -> std::result::Result<DecodedMessage, DecodeError> {
    let mut decoded = DecodedMessage::for_message(message);
    let mut reader = Reader::new(buffer);
    let mut skipped = 0usize;

    while !reader.is_at_end() {
        let tag = reader.read_tag()?;

        let Some(field) = message.field_by_number(tag.field_number) else {
            trace!(
                "Skipping unknown field {} ({}) at offset {}",
                tag.field_number,
                tag.wire_type.as_str(),
                tag.offset
            );
            reader.skip(tag.wire_type)?;
            skipped += 1;
            continue;
        };

        let value = read_value(&mut reader, tag.wire_type, &field.field_type)?;
        trace!("Decoded field {} = {:?}", field.name, value);
        decoded.store(field, value);
    }

    debug!(
        "Decoded {} bytes as {}: {} field(s), {} unknown skipped",
        buffer.len(),
        message.name,
        decoded.len(),
        skipped
    );
    Ok(decoded)
}

/// Reads a payload file and decodes it as `message`
pub fn decode_file(path: impl AsRef<Path>, message: &Message) -> Result<DecodedMessage> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Ok(decode(&data, message)?)
}

fn read_value(
    reader: &mut Reader<'_>,
    wire_type: WireType,
    field_type: &FieldType,
) -> std::result::Result<DecodedValue, DecodeError> {
    let value = match wire_type {
        WireType::Varint => {
            let raw = reader.read_varint()?;
            match field_type {
                FieldType::Bool => DecodedValue::Bool(raw != 0),
                _ => DecodedValue::Int(raw),
            }
        }
        WireType::Len => {
            let payload = reader.read_length_delimited()?;
            match field_type {
                FieldType::String => {
                    DecodedValue::String(String::from_utf8_lossy(payload).into_owned())
                }
                FieldType::Bytes => DecodedValue::Bytes(payload.to_vec()),
                other => DecodedValue::Opaque(format!("<{}: {} bytes>", other, payload.len())),
            }
        }
        WireType::I64 => DecodedValue::Opaque(hex_summary(&reader.read_fixed::<8>()?)),
        WireType::I32 => {
            let bytes = reader.read_fixed::<4>()?;
            match field_type {
                FieldType::Float => DecodedValue::Float(f32::from_le_bytes(bytes)),
                _ => DecodedValue::Opaque(hex_summary(&bytes)),
            }
        }
    };

    Ok(value)
}

/// `0x`-prefixed lowercase hex of the bytes in wire order
fn hex_summary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::schema::Field;
    use pretty_assertions::assert_eq;

    fn sample() -> Message {
        Message::new("M")
            .with_field(Field::new("int32", "id", 1))
            .with_field(Field::new("string", "tag", 2).repeated())
    }

    fn single<'a>(decoded: &'a DecodedMessage, name: &str) -> &'a DecodedValue {
        decoded.get(name).and_then(DecodedEntry::as_single).unwrap()
    }

    #[test]
    fn test_id_and_tags() {
        let buffer = [0x08, 0x05, 0x12, 0x01, b'a', 0x12, 0x02, b'b', b'b'];
        let decoded = decode(&buffer, &sample()).unwrap();

        assert_eq!(single(&decoded, "id"), &DecodedValue::Int(5));
        assert_eq!(
            decoded.get("tag").unwrap(),
            &DecodedEntry::Repeated(vec![
                DecodedValue::String("a".to_string()),
                DecodedValue::String("bb".to_string()),
            ])
        );
    }

    #[test]
    fn test_truncated_second_tag() {
        // Second tag entry declares 5 bytes but only 2 follow
        let buffer = [0x08, 0x05, 0x12, 0x01, b'a', 0x12, 0x05, b'b', b'b'];
        let err = decode(&buffer, &sample()).unwrap_err();

        assert_eq!(err.kind(), DecodeErrorKind::TruncatedLengthDelimited);
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn test_empty_buffer() {
        let decoded = decode(&[], &sample()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(
            decoded.get("tag").unwrap(),
            &DecodedEntry::Repeated(Vec::new())
        );
    }

    #[test]
    fn test_bool_and_raw_varint() {
        let message = Message::new("M")
            .with_field(Field::new("bool", "on", 1))
            .with_field(Field::new("bool", "off", 2))
            .with_field(Field::new("int32", "neg", 3));

        // neg = -1 as a ten-byte two's complement varint
        let mut buffer = vec![0x08, 0x02, 0x10, 0x00, 0x18];
        buffer.extend_from_slice(&[0xFF; 9]);
        buffer.push(0x01);

        let decoded = decode(&buffer, &message).unwrap();
        assert_eq!(single(&decoded, "on"), &DecodedValue::Bool(true));
        assert_eq!(single(&decoded, "off"), &DecodedValue::Bool(false));
        assert_eq!(single(&decoded, "neg"), &DecodedValue::Int(u64::MAX));
    }

    #[test]
    fn test_fixed_width_values() {
        let message = Message::new("M")
            .with_field(Field::new("float", "ratio", 1))
            .with_field(Field::new("fixed32", "flags", 2))
            .with_field(Field::new("double", "big", 3));

        let mut buffer = vec![0x0D];
        buffer.extend_from_slice(&1.5f32.to_le_bytes());
        buffer.extend_from_slice(&[0x15, 0xDE, 0xAD, 0xBE, 0xEF]);
        buffer.push(0x19);
        buffer.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let decoded = decode(&buffer, &message).unwrap();
        assert_eq!(single(&decoded, "ratio"), &DecodedValue::Float(1.5));
        assert_eq!(
            single(&decoded, "flags"),
            &DecodedValue::Opaque("0xdeadbeef".to_string())
        );
        assert_eq!(
            single(&decoded, "big"),
            &DecodedValue::Opaque("0x0102030405060708".to_string())
        );
    }

    #[test]
    fn test_nested_and_bytes() {
        let message = Message::new("M")
            .with_field(Field::new("Inner", "child", 1))
            .with_field(Field::new("bytes", "raw", 2))
            .with_field(Field::new("string", "text", 3));

        let buffer = [
            0x0A, 0x02, 0x08, 0x01, // child
            0x12, 0x03, 0x00, 0xFF, 0x10, // raw
            0x1A, 0x02, 0xC3, 0x28, // invalid UTF-8
        ];

        let decoded = decode(&buffer, &message).unwrap();
        assert_eq!(
            single(&decoded, "child"),
            &DecodedValue::Opaque("<Inner: 2 bytes>".to_string())
        );
        assert_eq!(single(&decoded, "raw"), &DecodedValue::Bytes(vec![0x00, 0xFF, 0x10]));
        assert_eq!(
            single(&decoded, "text"),
            &DecodedValue::String("\u{FFFD}(".to_string())
        );
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let mut buffer = vec![
            0x78, 0x2A, // field 15 varint
            0x81, 0x01, 1, 2, 3, 4, 5, 6, 7, 8, // field 16 i64
            0x8A, 0x01, 0x02, b'x', b'y', // field 17 len
            0x9D, 0x01, 1, 2, 3, 4, // field 19 i32
        ];
        buffer.extend_from_slice(&[0x08, 0x07]);

        let decoded = decode(&buffer, &sample()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(single(&decoded, "id"), &DecodedValue::Int(7));
    }

    #[test]
    fn test_duplicate_single_field_last_wins() {
        let decoded = decode(&[0x08, 0x01, 0x08, 0x02], &sample()).unwrap();
        assert_eq!(single(&decoded, "id"), &DecodedValue::Int(2));
    }

    #[test]
    fn test_wire_type_mismatch_is_best_effort() {
        // id declared int32 but sent length-delimited; tag declared string but sent varint
        let decoded = decode(&[0x0A, 0x01, 0x00, 0x10, 0x03], &sample()).unwrap();
        assert_eq!(
            single(&decoded, "id"),
            &DecodedValue::Opaque("<int32: 1 bytes>".to_string())
        );
        assert_eq!(
            decoded.get("tag").unwrap(),
            &DecodedEntry::Repeated(vec![DecodedValue::Int(3)])
        );
    }

    #[test]
    fn test_error_offsets() {
        let message = sample();
        let cases: [(&[u8], DecodeErrorKind, usize); 5] = [
            (&[0x08, 0x05, 0x08], DecodeErrorKind::TruncatedVarint, 3),
            (&[0x08, 0x80], DecodeErrorKind::TruncatedVarint, 1),
            (&[0x08, 0x05, 0x0D, 0x01, 0x02], DecodeErrorKind::TruncatedFixedWidth, 3),
            (&[0x08, 0x05, 0x0B], DecodeErrorKind::UnsupportedWireType, 2),
            (
                &[0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01],
                DecodeErrorKind::VarintTooLong,
                1,
            ),
        ];

        for (buffer, kind, offset) in cases {
            let err = decode(buffer, &message).unwrap_err();
            assert_eq!((err.kind(), err.offset()), (kind, offset), "buffer {:02x?}", buffer);
        }
    }

    #[test]
    fn test_unknown_field_truncation_still_fails() {
        // field 9, len 4, only 1 byte
        let err = decode(&[0x4A, 0x04, 0x00], &sample()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedLengthDelimited {
                offset: 2,
                declared: 4,
                available: 1
            }
        );
    }

    #[test]
    fn test_decode_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, [0x08, 0x2A]).unwrap();

        let decoded = decode_file(&path, &sample()).unwrap();
        assert_eq!(single(&decoded, "id"), &DecodedValue::Int(42));

        std::fs::write(&path, [0x08]).unwrap();
        let err = decode_file(&path, &sample()).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::TruncatedVarint { offset: 1 })));
    }
}

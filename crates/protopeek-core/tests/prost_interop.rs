//! Decoding payloads produced by prost against text schemas.

use pretty_assertions::assert_eq;
use prost::encoding::{encode_key, encode_varint, WireType};
use prost::Message as _;
use protopeek_core::wire;
use protopeek_core::{decode, extract, DecodeErrorKind, DecodedEntry, DecodedValue};
use serde_json::json;

const SCHEMA: &str = r#"
    syntax = "proto3";
    package telemetry;

    // A single sensor reading
    message Reading {
        int32 id = 1;
        repeated string tag = 2;
        bool ok = 3;
        bytes raw = 4;
        float ratio = 5;
        Inner inner = 6;
        uint64 count = 7;
        repeated bytes chunks = 8;
    }

    message Inner {
        string note = 1;
    }
"#;

#[derive(Clone, PartialEq, prost::Message)]
struct Reading {
    #[prost(int32, tag = "1")]
    id: i32,
    #[prost(string, repeated, tag = "2")]
    tag: Vec<String>,
    #[prost(bool, tag = "3")]
    ok: bool,
    #[prost(bytes = "vec", tag = "4")]
    raw: Vec<u8>,
    #[prost(float, tag = "5")]
    ratio: f32,
    #[prost(message, optional, tag = "6")]
    inner: Option<Inner>,
    #[prost(uint64, tag = "7")]
    count: u64,
    #[prost(bytes = "vec", repeated, tag = "8")]
    chunks: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Inner {
    #[prost(string, tag = "1")]
    note: String,
}

/// Same field numbers as `Reading`, plus fields the text schema lacks
#[derive(Clone, PartialEq, prost::Message)]
struct ReadingV2 {
    #[prost(int32, tag = "1")]
    id: i32,
    #[prost(string, tag = "20")]
    label: String,
    #[prost(fixed64, tag = "21")]
    stamp: u64,
    #[prost(sfixed32, tag = "22")]
    delta: i32,
    #[prost(sint64, tag = "23")]
    drift: i64,
}

#[test]
fn decodes_every_declared_field() {
    let schema = extract(SCHEMA).unwrap();
    assert_eq!(schema.package, "telemetry");
    let reading = schema.message("Reading").unwrap();

    let payload = Reading {
        id: 42,
        tag: vec!["north".to_string(), "".to_string(), "ümlaut".to_string()],
        ok: true,
        raw: vec![0, 1, 255],
        ratio: 0.25,
        inner: Some(Inner {
            note: "hi".to_string(),
        }),
        count: u64::MAX,
        chunks: Vec::new(),
    }
    .encode_to_vec();

    let decoded = decode(&payload, reading).unwrap();
    assert_eq!(
        serde_json::to_value(&decoded).unwrap(),
        json!({
            "tag": ["north", "", "ümlaut"],
            "chunks": [],
            "id": 42,
            "ok": true,
            "raw": [0, 1, 255],
            "ratio": 0.25,
            "inner": "<Inner: 4 bytes>",
            "count": u64::MAX,
        })
    );
}

#[test]
fn absent_repeated_fields_are_empty() {
    let schema = extract(SCHEMA).unwrap();
    let reading = schema.message("Reading").unwrap();

    let payload = Reading {
        id: 7,
        ..Default::default()
    }
    .encode_to_vec();

    let decoded = decode(&payload, reading).unwrap();
    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded.get("tag"), Some(&DecodedEntry::Repeated(Vec::new())));
    assert_eq!(decoded.get("chunks"), Some(&DecodedEntry::Repeated(Vec::new())));
    assert_eq!(
        decoded.get("id").and_then(DecodedEntry::as_single),
        Some(&DecodedValue::Int(7))
    );
    assert!(decoded.get("ok").is_none());
}

#[test]
fn undeclared_fields_are_skipped() {
    let schema = extract(SCHEMA).unwrap();
    let reading = schema.message("Reading").unwrap();

    let payload = ReadingV2 {
        id: 3,
        label: "extra".to_string(),
        stamp: 0x0102_0304_0506_0708,
        delta: -5,
        drift: -1_000_000,
    }
    .encode_to_vec();

    let decoded = decode(&payload, reading).unwrap();
    let keys: Vec<_> = decoded.iter().map(|(name, _)| name).collect();
    assert_eq!(keys, ["tag", "chunks", "id"]);
}

#[test]
fn negative_int32_decodes_as_raw_magnitude() {
    let schema = extract(SCHEMA).unwrap();
    let reading = schema.message("Reading").unwrap();

    let payload = Reading {
        id: -2,
        ..Default::default()
    }
    .encode_to_vec();

    let decoded = decode(&payload, reading).unwrap();
    assert_eq!(
        decoded.get("id").and_then(DecodedEntry::as_single),
        Some(&DecodedValue::Int(-2i64 as u64))
    );
}

#[test]
fn varints_match_prost_encoding() {
    let mut value: u64 = 1;
    let mut samples = vec![0u64, i64::MAX as u64];
    while value < i64::MAX as u64 / 3 {
        samples.push(value);
        samples.push(value - 1);
        samples.push(value + 1);
        value *= 3;
    }

    for sample in samples {
        let mut ours = Vec::new();
        wire::encode_varint(sample, &mut ours);

        let mut theirs = Vec::new();
        encode_varint(sample, &mut theirs);
        assert_eq!(ours, theirs, "value {}", sample);

        let (decoded, len) = wire::decode_varint(&theirs).unwrap();
        assert_eq!((decoded, len), (sample, theirs.len()));
    }
}

#[test]
fn every_truncation_point_fails() {
    let schema = extract(SCHEMA).unwrap();
    let reading = schema.message("Reading").unwrap();

    let payload = Reading {
        id: 300,
        tag: vec!["abc".to_string()],
        ratio: 1.0,
        ..Default::default()
    }
    .encode_to_vec();
    // id: 08 ac 02 | tag: 12 03 'a' 'b' 'c' | ratio: 2d 00 00 80 3f
    assert_eq!(payload.len(), 13);

    let expected = [
        (1, DecodeErrorKind::TruncatedVarint, 1),
        (2, DecodeErrorKind::TruncatedVarint, 1),
        (4, DecodeErrorKind::TruncatedVarint, 4),
        (5, DecodeErrorKind::TruncatedLengthDelimited, 5),
        (7, DecodeErrorKind::TruncatedLengthDelimited, 5),
        (9, DecodeErrorKind::TruncatedFixedWidth, 9),
        (12, DecodeErrorKind::TruncatedFixedWidth, 9),
    ];

    for (cut, kind, offset) in expected {
        let err = decode(&payload[..cut], reading).unwrap_err();
        assert_eq!((err.kind(), err.offset()), (kind, offset), "cut at {}", cut);
    }

    // Cuts on a field boundary are complete payloads
    for cut in [0, 3, 8, 13] {
        assert!(decode(&payload[..cut], reading).is_ok(), "cut at {}", cut);
    }
}

#[test]
fn hand_built_group_tag_is_rejected() {
    let schema = extract(SCHEMA).unwrap();
    let reading = schema.message("Reading").unwrap();

    let mut payload = Vec::new();
    encode_key(1, WireType::Varint, &mut payload);
    encode_varint(1, &mut payload);
    encode_key(2, WireType::StartGroup, &mut payload);

    let err = decode(&payload, reading).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::UnsupportedWireType);
    assert_eq!(err.offset(), 2);
}

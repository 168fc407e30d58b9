//! # protopeek-core
//!
//! A library for decoding Protocol Buffer wire-format payloads against a
//! schema extracted from simple `.proto` text.
//!
//! This crate provides the core functionality for:
//! - Extracting message definitions from schema text
//! - Reading and writing raw protobuf wire format data
//! - Decoding a payload into a flat field-name to value mapping
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`schema`]: Schema extraction and rendering
//! - [`decode`]: Schema-guided payload decoding
//! - [`wire`]: Low-level wire format primitives
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use protopeek_core::{decode, extract, DecodedValue};
//!
//! let schema = extract(r#"
//!     syntax = "proto3";
//!     package demo;
//!
//!     message Fish {
//!         string kind = 1;
//!         int32 distance = 2;
//!     }
//! "#)?;
//!
//! let fish = schema.message("Fish").unwrap();
//! let decoded = decode(b"\x0a\x05Perch\x10\xa9\x46", fish)?;
//!
//! assert_eq!(decoded.get("kind").unwrap().as_single().unwrap().as_str(), Some("Perch"));
//! assert_eq!(decoded.get("distance").unwrap().as_single(), Some(&DecodedValue::Int(9001)));
//! # Ok::<(), protopeek_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! The [`SchemaWriter`] trait customizes how a parsed schema is written out.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod decode;
pub mod error;
pub mod schema;
pub mod wire;

// Re-export primary types for convenience
pub use decode::{decode, decode_file, DecodedEntry, DecodedMessage, DecodedValue};
pub use error::{DecodeError, DecodeErrorKind, Error, Result, SchemaError};
pub use schema::{
    extract, extract_bytes, extract_file, Field, FieldType, Message, RenderConfig, Schema,
    SchemaWriter,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

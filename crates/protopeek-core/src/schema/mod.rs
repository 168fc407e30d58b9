//! Schema extraction from `.proto`-style text.
//!
//! The extractor understands a small subset of the schema language: a
//! `package` declaration, top-level `message` blocks and the scalar or named
//! fields inside them. Everything else (imports, enums, services, options,
//! maps) is tolerated and ignored.
//!
//! Extraction is best-effort: text that does not look like a schema produces
//! an empty [`Schema`] rather than an error.
//!
//! ```
//! use protopeek_core::schema::{extract, FieldType};
//!
//! let schema = extract("package demo; message M { int32 id = 1; repeated string tag = 2; }")?;
//! assert_eq!(schema.package, "demo");
//!
//! let message = schema.message("M").unwrap();
//! assert_eq!(message.fields[1].field_type, FieldType::String);
//! assert!(message.fields[1].repeated);
//! # Ok::<(), protopeek_core::SchemaError>(())
//! ```

mod extract;
mod lexer;
pub mod render;

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub use extract::{extract, extract_bytes, extract_file};
pub use render::{walk, NullWriter, ProtoTextWriter, RenderConfig, SchemaWriter, StatsWriter};

/// A parsed schema: a package name and its messages in definition order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Package name, empty when the text declares none
    pub package: String,
    /// Top-level messages in textual order
    pub messages: Vec<Message>,
}

impl Schema {
    /// Returns the first message with the given name
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Iterates over message names in definition order
    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.name.as_str())
    }

    /// Returns true if no message was found
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A message definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Message name as written
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

impl Message {
    /// Creates an empty message
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field, builder style
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by its wire number.
    ///
    /// With duplicate numbers the first declared field wins.
    pub fn field_by_number(&self, number: u64) -> Option<&Field> {
        self.fields.iter().find(|f| u64::from(f.number) == number)
    }

    /// Looks up a field by name
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Field name
    pub name: String,
    /// Wire field number
    pub number: u32,
    /// Declared with `repeated`
    pub repeated: bool,
    /// Declared with `optional`
    pub optional: bool,
}

impl Field {
    /// Creates a plain (neither repeated nor optional) field
    pub fn new(field_type: impl Into<FieldType>, name: impl Into<String>, number: u32) -> Self {
        Self {
            field_type: field_type.into(),
            name: name.into(),
            number,
            repeated: false,
            optional: false,
        }
    }

    /// Marks the field as repeated
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Marks the field as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The modifier keyword this field is written with, if any
    pub fn label(&self) -> Option<&'static str> {
        if self.repeated {
            Some("repeated")
        } else if self.optional {
            Some("optional")
        } else {
            None
        }
    }
}

/// Declared field type.
///
/// Any identifier outside the scalar vocabulary becomes [`FieldType::Named`]
/// and is treated as an opaque (usually nested message) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `double`
    Double,
    /// `float`
    Float,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint32`
    UInt32,
    /// `uint64`
    UInt64,
    /// `sint32`
    SInt32,
    /// `sint64`
    SInt64,
    /// `fixed32`
    Fixed32,
    /// `fixed64`
    Fixed64,
    /// `sfixed32`
    SFixed32,
    /// `sfixed64`
    SFixed64,
    /// `bool`
    Bool,
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// Any other type name
    Named(String),
}

impl FieldType {
    /// The type name as written in schema text
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UInt32 => "uint32",
            FieldType::UInt64 => "uint64",
            FieldType::SInt32 => "sint32",
            FieldType::SInt64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::SFixed32 => "sfixed32",
            FieldType::SFixed64 => "sfixed64",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Named(name) => name,
        }
    }

    /// Returns true for the built-in scalar vocabulary
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Named(_))
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "double" => FieldType::Double,
            "float" => FieldType::Float,
            "int32" => FieldType::Int32,
            "int64" => FieldType::Int64,
            "uint32" => FieldType::UInt32,
            "uint64" => FieldType::UInt64,
            "sint32" => FieldType::SInt32,
            "sint64" => FieldType::SInt64,
            "fixed32" => FieldType::Fixed32,
            "fixed64" => FieldType::Fixed64,
            "sfixed32" => FieldType::SFixed32,
            "sfixed64" => FieldType::SFixed64,
            "bool" => FieldType::Bool,
            "string" => FieldType::String,
            "bytes" => FieldType::Bytes,
            other => FieldType::Named(other.to_string()),
        })
    }
}

impl From<&str> for FieldType {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(field_type) => field_type,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

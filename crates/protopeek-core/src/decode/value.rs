//! Decoded payload values.

use crate::schema::{Field, Message};
use indexmap::IndexMap;
use serde::Serialize;

/// One decoded field occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    /// `bool` varint
    Bool(bool),
    /// Any other varint, unsigned and without zig-zag decoding
    Int(u64),
    /// `string` payload
    String(String),
    /// `bytes` payload
    Bytes(Vec<u8>),
    /// `float` fixed 32-bit value
    Float(f32),
    /// Summary of a value with no scalar interpretation
    Opaque(String),
}

impl DecodedValue {
    /// Returns the integer payload, if this is an integer
    pub fn as_int(&self) -> Option<u64> {
        match self {
            DecodedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The decoded value(s) of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedEntry {
    /// Non-repeated field; last occurrence wins
    Single(DecodedValue),
    /// Repeated field in wire order
    Repeated(Vec<DecodedValue>),
}

impl DecodedEntry {
    /// Returns the single value, if this entry is not repeated
    pub fn as_single(&self) -> Option<&DecodedValue> {
        match self {
            DecodedEntry::Single(value) => Some(value),
            DecodedEntry::Repeated(_) => None,
        }
    }

    /// Returns the values, if this entry is repeated
    pub fn as_repeated(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedEntry::Single(_) => None,
            DecodedEntry::Repeated(values) => Some(values),
        }
    }
}

/// Field name to decoded value mapping for one payload.
///
/// Keys keep insertion order: declared repeated fields first (pre-seeded as
/// empty sequences), then other fields as they first appear on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecodedMessage {
    fields: IndexMap<String, DecodedEntry>,
}

impl DecodedMessage {
    /// Creates a mapping with an empty sequence for every repeated field
    pub fn for_message(message: &Message) -> Self {
        let fields = message
            .fields
            .iter()
            .filter(|f| f.repeated)
            .map(|f| (f.name.clone(), DecodedEntry::Repeated(Vec::new())))
            .collect();
        Self { fields }
    }

    /// Stores one decoded occurrence of `field`
    pub(crate) fn store(&mut self, field: &Field, value: DecodedValue) {
        if !field.repeated {
            self.fields
                .insert(field.name.clone(), DecodedEntry::Single(value));
            return;
        }

        let entry = self
            .fields
            .entry(field.name.clone())
            .or_insert_with(|| DecodedEntry::Repeated(Vec::new()));
        match entry {
            DecodedEntry::Repeated(values) => values.push(value),
            // A non-repeated field with the same name was stored first
            single => *single = DecodedEntry::Repeated(vec![value]),
        }
    }

    /// Looks up a field by name
    pub fn get(&self, name: &str) -> Option<&DecodedEntry> {
        self.fields.get(name)
    }

    /// Iterates over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedEntry)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields present
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if nothing was decoded and no repeated field is declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consumes the message, returning the underlying map
    pub fn into_inner(self) -> IndexMap<String, DecodedEntry> {
        self.fields
    }
}

//! Extensible schema writing.
//!
//! [`walk`] drives a [`SchemaWriter`] over a [`Schema`]. The default
//! [`ProtoTextWriter`] renders normalized schema text that extracts back to
//! an equal schema; [`StatsWriter`] and [`NullWriter`] show lighter uses.

use super::{Field, Message, Schema};
use std::fmt::{self, Result, Write as FmtWrite};

/// Trait for writing schema elements to output.
///
/// Every hook defaults to a no-op, so implementors only override what they
/// need.
pub trait SchemaWriter {
    /// Called once before any message
    fn write_schema(&mut self, schema: &Schema) -> Result {
        let _ = schema;
        Ok(())
    }

    /// Called when a message starts
    fn write_message(&mut self, message: &Message) -> Result {
        let _ = message;
        Ok(())
    }

    /// Called for each field of the current message
    fn write_field(&mut self, field: &Field) -> Result {
        let _ = field;
        Ok(())
    }

    /// Called after the last field of a message
    fn finish_message(&mut self, message: &Message) -> Result {
        let _ = message;
        Ok(())
    }

    /// Whether fields should be visited in field-number order
    fn sort_fields(&self) -> bool {
        false
    }
}

/// Visits every message and field of `schema` in order
pub fn walk<W: SchemaWriter + ?Sized>(schema: &Schema, writer: &mut W) -> Result {
    writer.write_schema(schema)?;

    for message in &schema.messages {
        writer.write_message(message)?;

        let mut fields: Vec<&Field> = message.fields.iter().collect();
        if writer.sort_fields() {
            fields.sort_by_key(|f| f.number);
        }
        for field in fields {
            writer.write_field(field)?;
        }

        writer.finish_message(message)?;
    }

    Ok(())
}

/// A no-op writer that discards all output
pub struct NullWriter;

impl SchemaWriter for NullWriter {}

/// A writer that collects statistics about the schema
#[derive(Debug, Default)]
pub struct StatsWriter {
    /// Number of messages
    pub message_count: usize,
    /// Number of fields
    pub field_count: usize,
    /// Number of repeated fields
    pub repeated_count: usize,
    /// Number of optional fields
    pub optional_count: usize,
    /// Number of fields with a non-scalar type
    pub named_type_count: usize,
}

impl SchemaWriter for StatsWriter {
    fn write_message(&mut self, _message: &Message) -> Result {
        self.message_count += 1;
        Ok(())
    }

    fn write_field(&mut self, field: &Field) -> Result {
        self.field_count += 1;
        self.repeated_count += usize::from(field.repeated);
        self.optional_count += usize::from(field.optional);
        self.named_type_count += usize::from(!field.field_type.is_scalar());
        Ok(())
    }
}

/// Configuration for schema rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Indentation string (default: 2 spaces)
    pub indent_str: String,
    /// Sort fields by number
    pub sort_fields: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_str: "  ".to_string(),
            sort_fields: false,
        }
    }
}

impl RenderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets whether to sort fields by number
    pub fn sort_fields(mut self, sort: bool) -> Self {
        self.sort_fields = sort;
        self
    }
}

/// Writes schema text in normalized `.proto` syntax
pub struct ProtoTextWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a RenderConfig,
}

impl<'a, W: FmtWrite> ProtoTextWriter<'a, W> {
    /// Creates a writer targeting `writer`
    pub fn new(writer: &'a mut W, config: &'a RenderConfig) -> Self {
        Self { writer, config }
    }
}

impl<W: FmtWrite> SchemaWriter for ProtoTextWriter<'_, W> {
    fn write_schema(&mut self, schema: &Schema) -> Result {
        writeln!(self.writer, "syntax = \"proto3\";")?;
        writeln!(self.writer)?;

        if !schema.package.is_empty() {
            writeln!(self.writer, "package {};", schema.package)?;
            writeln!(self.writer)?;
        }

        Ok(())
    }

    fn write_message(&mut self, message: &Message) -> Result {
        writeln!(self.writer, "message {} {{", message.name)
    }

    fn write_field(&mut self, field: &Field) -> Result {
        write!(self.writer, "{}", self.config.indent_str)?;
        if let Some(label) = field.label() {
            write!(self.writer, "{} ", label)?;
        }
        writeln!(
            self.writer,
            "{} {} = {};",
            field.field_type, field.name, field.number
        )
    }

    fn finish_message(&mut self, _message: &Message) -> Result {
        writeln!(self.writer, "}}")?;
        writeln!(self.writer)
    }

    fn sort_fields(&self) -> bool {
        self.config.sort_fields
    }
}

impl Schema {
    /// Renders the schema as text with the default configuration
    pub fn render(&self) -> String {
        self.render_with(&RenderConfig::default())
    }

    /// Renders the schema as text
    pub fn render_with(&self, config: &RenderConfig) -> String {
        let mut output = String::new();
        self.write_to(&mut output, config)
            .expect("String write cannot fail");
        output
    }

    /// Writes the rendered schema to a formatter sink
    pub fn write_to(&self, w: &mut impl FmtWrite, config: &RenderConfig) -> fmt::Result {
        walk(self, &mut ProtoTextWriter::new(w, config))
    }
}

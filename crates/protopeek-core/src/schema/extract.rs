//! Bracket-depth scanner turning schema tokens into a [`Schema`].
//!
//! Blocks are matched by counting braces, so message bodies may nest to any
//! depth. Inside a message body:
//!
//! - `[repeated|optional|required] <type> <name> = <number> [options];`
//!   statements become fields
//! - `oneof <name> { ... }` blocks contribute their fields to the enclosing
//!   message
//! - any other nested block (`message`, `enum`, ...) is skipped as a unit
//!
//! A block left open at end of input is dropped.

use super::lexer::{Lexer, Token};
use super::{Field, FieldType, Message, Schema};
use crate::error::{Error, Result, SchemaError};
use std::path::Path;
use tracing::{debug, trace};

/// Extracts a schema from text.
///
/// Never fails on malformed or unrelated text; the only error is a field
/// number literal too large for a `u32`.
pub fn extract(text: &str) -> std::result::Result<Schema, SchemaError> {
    let tokens: Vec<Token<'_>> = Lexer::new(text).collect();
    let schema = Parser::new(&tokens).parse_file()?;

    debug!(
        "Extracted {} message(s) from {} bytes of schema text",
        schema.messages.len(),
        text.len()
    );
    Ok(schema)
}

/// Extracts a schema from raw bytes, rejecting input that is not UTF-8
pub fn extract_bytes(data: &[u8]) -> std::result::Result<Schema, SchemaError> {
    let text = std::str::from_utf8(data).map_err(|e| SchemaError::NotText {
        valid_up_to: e.valid_up_to(),
    })?;
    extract(text)
}

/// Reads a schema file and extracts it
pub fn extract_file(path: impl AsRef<Path>) -> Result<Schema> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Ok(extract_bytes(&data)?)
}

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek_at(&self, ahead: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + ahead).copied()
    }

    fn parse_file(&mut self) -> std::result::Result<Schema, SchemaError> {
        let mut schema = Schema::default();
        let mut package: Option<&'a str> = None;

        while let Some(token) = self.peek_at(0) {
            match token {
                Token::Ident("package") => {
                    self.pos += 1;
                    if let (Some(Token::Ident(name)), Some(Token::Symbol(';'))) =
                        (self.peek_at(0), self.peek_at(1))
                    {
                        package.get_or_insert(name);
                        self.pos += 2;
                    }
                }
                Token::Ident("message") => {
                    self.pos += 1;
                    let (Some(Token::Ident(name)), Some(Token::Symbol('{'))) =
                        (self.peek_at(0), self.peek_at(1))
                    else {
                        continue;
                    };
                    self.pos += 2;

                    let mut message = Message::new(name);
                    if !self.parse_body(&mut message)? {
                        trace!("Dropping unterminated message {}", name);
                        break;
                    }
                    trace!("Found message {} with {} field(s)", name, message.fields.len());
                    schema.messages.push(message);
                }
                Token::Symbol('{') => {
                    self.pos += 1;
                    self.skip_block();
                }
                _ => self.pos += 1,
            }
        }

        schema.package = package.unwrap_or_default().to_string();
        Ok(schema)
    }

    /// Parses statements up to the brace closing the message body.
    ///
    /// `oneof` blocks are tracked with a counter rather than recursion, so
    /// nesting depth is bounded only by the input. Returns false if input
    /// ended first.
    fn parse_body(&mut self, message: &mut Message) -> std::result::Result<bool, SchemaError> {
        let tokens = self.tokens;
        let mut statement_start = self.pos;
        let mut open_oneofs = 0usize;

        while let Some(token) = self.peek_at(0) {
            match token {
                Token::Symbol(';') => {
                    let statement = &tokens[statement_start..self.pos];
                    if let Some(field) = field_from_statement(&message.name, statement)? {
                        message.fields.push(field);
                    } else if !statement.is_empty() {
                        trace!("Ignoring statement in {}: {:?}", message.name, statement);
                    }
                    self.pos += 1;
                    statement_start = self.pos;
                }
                Token::Symbol('{') => {
                    let header = &tokens[statement_start..self.pos];
                    self.pos += 1;
                    if matches!(header, [Token::Ident("oneof"), Token::Ident(_)]) {
                        open_oneofs += 1;
                    } else if !self.skip_block() {
                        return Ok(false);
                    }
                    statement_start = self.pos;
                }
                Token::Symbol('}') => {
                    self.pos += 1;
                    if open_oneofs == 0 {
                        return Ok(true);
                    }
                    open_oneofs -= 1;
                    statement_start = self.pos;
                }
                Token::Symbol('[') => {
                    self.pos += 1;
                    self.skip_options();
                }
                _ => self.pos += 1,
            }
        }

        Ok(false)
    }

    /// Skips to the brace closing the current block.
    ///
    /// Returns false if input ended first.
    fn skip_block(&mut self) -> bool {
        let mut depth = 1usize;
        while let Some(token) = self.peek_at(0) {
            self.pos += 1;
            match token {
                Token::Symbol('{') => depth += 1,
                Token::Symbol('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Skips a bracketed option list; braces inside it are literal values
    fn skip_options(&mut self) {
        let mut depth = 1usize;
        while let Some(token) = self.peek_at(0) {
            self.pos += 1;
            match token {
                Token::Symbol('[') => depth += 1,
                Token::Symbol(']') => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}

fn field_from_statement(
    message: &str,
    statement: &[Token<'_>],
) -> std::result::Result<Option<Field>, SchemaError> {
    let (label, rest) = match statement {
        [Token::Ident(label @ ("repeated" | "optional" | "required")), rest @ ..] => {
            (Some(*label), rest)
        }
        _ => (None, statement),
    };

    let [Token::Ident(type_name), Token::Ident(name), Token::Symbol('='), Token::Number(literal), options @ ..] =
        rest
    else {
        return Ok(None);
    };

    let options_ok = match options {
        [] => true,
        [Token::Symbol('['), .., Token::Symbol(']')] => true,
        _ => false,
    };
    if !options_ok
        || name.contains('.')
        || matches!(*type_name, "option" | "reserved" | "extensions")
        || !literal.bytes().all(|b| b.is_ascii_digit())
    {
        return Ok(None);
    }

    let number = literal
        .parse::<u32>()
        .map_err(|_| SchemaError::FieldNumberOverflow {
            message: message.to_string(),
            field: name.to_string(),
            literal: literal.to_string(),
        })?;

    Ok(Some(Field {
        field_type: FieldType::from(*type_name),
        name: name.to_string(),
        number,
        repeated: label == Some("repeated"),
        optional: label == Some("optional"),
    }))
}

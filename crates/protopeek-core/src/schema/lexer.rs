//! Tokenizer for schema text.
//!
//! The token set is deliberately small: identifiers (including dotted
//! qualified names), number literals, string literals and single-character
//! punctuation. Whitespace and comments never reach the parser.

/// A lexical token borrowed from the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Identifier or dotted type name (`foo`, `pkg.Bar`, `.pkg.Bar`)
    Ident(&'a str),
    /// Anything starting with a digit (`42`, `0x1F`, `1.5`)
    Number(&'a str),
    /// Quoted string literal, contents unused
    Str,
    /// Any other single character
    Symbol(char),
}

/// Iterator over the tokens of a schema text
pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek_byte(0).is_some_and(|b| b.is_ascii_whitespace()) {
                self.pos += 1;
            }

            let rest = &self.src[self.pos..];
            if rest.starts_with("//") {
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if rest.starts_with("/*") {
                self.pos += rest[2..].find("*/").map_or(rest.len(), |end| end + 4);
            } else {
                return;
            }
        }
    }

    /// Consumes bytes while they can continue a word
    fn take_word(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek_byte(0).is_some_and(is_word_byte) {
            self.pos += 1;
        }
        &src[start..self.pos]
    }

    fn skip_string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek_byte(0) {
            self.pos += 1;
            if b == b'\\' && self.peek_byte(0).is_some() {
                self.pos += 1;
            } else if b == quote {
                return;
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        self.skip_trivia();

        let b = self.peek_byte(0)?;
        let token = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => Token::Ident(self.take_word()),
            b'.' if self.peek_byte(1).is_some_and(is_ident_start) => {
                Token::Ident(self.take_word())
            }
            b'0'..=b'9' => Token::Number(self.take_word()),
            b'"' | b'\'' => {
                self.skip_string(b);
                Token::Str
            }
            _ => {
                let c = self.src[self.pos..].chars().next()?;
                self.pos += c.len_utf8();
                Token::Symbol(c)
            }
        };

        Some(token)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

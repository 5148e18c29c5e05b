use serde_json::Number;

use crate::error::TokenError;
use crate::reader::TokenReader;
use crate::token::{Embedded, Token, TokenKind};

// -----------------------------------------------------------------------------
// TokenWriter

/// A push writer producing a token stream.
///
/// Only [`write_token`](TokenWriter::write_token) is required, every other
/// method is a shorthand for one or more tokens.
pub trait TokenWriter {
    /// Appends one token.
    fn write_token(&mut self, token: Token) -> Result<(), TokenError>;

    #[inline]
    fn write_start_object(&mut self) -> Result<(), TokenError> {
        self.write_token(Token::StartObject)
    }

    #[inline]
    fn write_end_object(&mut self) -> Result<(), TokenError> {
        self.write_token(Token::EndObject)
    }

    #[inline]
    fn write_start_array(&mut self) -> Result<(), TokenError> {
        self.write_token(Token::StartArray)
    }

    #[inline]
    fn write_end_array(&mut self) -> Result<(), TokenError> {
        self.write_token(Token::EndArray)
    }

    #[inline]
    fn write_field_name(&mut self, name: &str) -> Result<(), TokenError> {
        self.write_token(Token::field(name))
    }

    #[inline]
    fn write_string(&mut self, value: &str) -> Result<(), TokenError> {
        self.write_token(Token::string(value))
    }

    #[inline]
    fn write_number(&mut self, value: Number) -> Result<(), TokenError> {
        self.write_token(Token::Number(value))
    }

    #[inline]
    fn write_bool(&mut self, value: bool) -> Result<(), TokenError> {
        self.write_token(Token::Bool(value))
    }

    #[inline]
    fn write_null(&mut self) -> Result<(), TokenError> {
        self.write_token(Token::Null)
    }

    #[inline]
    fn write_embedded(&mut self, value: Embedded) -> Result<(), TokenError> {
        self.write_token(Token::Embedded(value))
    }

    /// Writes `"name": "value"`.
    #[inline]
    fn write_string_field(&mut self, name: &str, value: &str) -> Result<(), TokenError> {
        self.write_field_name(name)?;
        self.write_string(value)
    }

    /// Copies the reader's current token without moving the reader.
    fn copy_current_event(&mut self, reader: &dyn TokenReader) -> Result<(), TokenError> {
        match reader.current() {
            Some(token) => self.write_token(token.clone()),
            None => Err(TokenError::UnexpectedEnd {
                expected: "a token to copy",
            }),
        }
    }

    /// Copies the value starting at the reader's current token.
    ///
    /// On a `FieldName` the name and its value are copied. The reader is left
    /// on the last copied token.
    fn copy_current_structure(&mut self, reader: &mut dyn TokenReader) -> Result<(), TokenError> {
        if reader.kind() == Some(TokenKind::FieldName) {
            self.copy_current_event(reader)?;
            reader.next_kind("a field value")?;
        }
        let Some(kind) = reader.kind() else {
            return Err(TokenError::UnexpectedEnd {
                expected: "a value to copy",
            });
        };
        self.copy_current_event(reader)?;
        if kind.is_structure_start() {
            let outer = reader.depth() - 1;
            loop {
                let next = reader.next_kind("the end of the copied structure")?;
                self.copy_current_event(reader)?;
                if next.is_structure_end() && reader.depth() == outer {
                    break;
                }
            }
        }
        Ok(())
    }
}

impl<W: TokenWriter + ?Sized> TokenWriter for &mut W {
    #[inline]
    fn write_token(&mut self, token: Token) -> Result<(), TokenError> {
        (**self).write_token(token)
    }
}

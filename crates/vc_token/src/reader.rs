use serde_json::Number;

use crate::error::TokenError;
use crate::path::DocumentPath;
use crate::token::{Embedded, Token, TokenKind};

// -----------------------------------------------------------------------------
// TokenReader

/// A pull reader over a token stream.
///
/// The reader exposes one current token at a time. A freshly created reader is
/// already positioned on its first token (or on nothing, for empty input).
///
/// # Position convention
///
/// Code that reads a value starts with the reader on the value's first token
/// and leaves it on the value's last token: the scalar itself, or the
/// `EndObject` / `EndArray` closing the structure. The caller then advances.
///
/// # Examples
///
/// ```
/// use vc_token::{TokenKind, TokenReader, json};
///
/// let buffer = json::from_str(r#"{"a":[1,2],"b":true}"#).unwrap();
/// let mut reader = buffer.reader();
///
/// assert_eq!(reader.kind(), Some(TokenKind::StartObject));
/// reader.advance().unwrap();
/// assert_eq!(reader.field_name(), Some("a"));
/// reader.advance().unwrap();
/// reader.skip_children().unwrap();
/// assert_eq!(reader.kind(), Some(TokenKind::EndArray));
/// reader.advance().unwrap();
/// assert_eq!(reader.field_name(), Some("b"));
/// ```
pub trait TokenReader {
    /// The current token, `None` once the input is exhausted.
    fn current(&self) -> Option<&Token>;

    /// Moves to the next token and returns its kind.
    fn advance(&mut self) -> Result<Option<TokenKind>, TokenError>;

    /// Number of structures open at the current token.
    ///
    /// A `StartObject` token counts its own object, the matching `EndObject`
    /// does not.
    fn depth(&self) -> usize;

    /// Location of the current token.
    fn path(&self) -> DocumentPath;

    /// Identity attached natively to the current `StartObject`, if the
    /// underlying format carries one.
    #[inline]
    fn native_object_id(&self) -> Option<&Token> {
        None
    }

    /// Kind of the current token.
    #[inline]
    fn kind(&self) -> Option<TokenKind> {
        self.current().map(Token::kind)
    }

    /// Advances and fails with `UnexpectedEnd` if the input is exhausted.
    #[inline]
    fn next_kind(&mut self, expected: &'static str) -> Result<TokenKind, TokenError> {
        self.advance()?.ok_or(TokenError::UnexpectedEnd { expected })
    }

    /// Fails unless the current token has kind `kind`.
    #[inline]
    fn expect(&self, kind: TokenKind, expected: &'static str) -> Result<(), TokenError> {
        match self.kind() {
            Some(found) if found == kind => Ok(()),
            found => Err(TokenError::unexpected(expected, found)),
        }
    }

    /// Name of the current `FieldName` token.
    #[inline]
    fn field_name(&self) -> Option<&str> {
        match self.current() {
            Some(Token::FieldName(name)) => Some(name),
            _ => None,
        }
    }

    /// Text of the current `String` or `FieldName` token.
    #[inline]
    fn text(&self) -> Option<&str> {
        match self.current() {
            Some(Token::String(text) | Token::FieldName(text)) => Some(text),
            _ => None,
        }
    }

    #[inline]
    fn number(&self) -> Option<&Number> {
        match self.current() {
            Some(Token::Number(number)) => Some(number),
            _ => None,
        }
    }

    #[inline]
    fn boolean(&self) -> Option<bool> {
        match self.current() {
            Some(Token::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    fn embedded(&self) -> Option<&Embedded> {
        match self.current() {
            Some(Token::Embedded(value)) => Some(value),
            _ => None,
        }
    }

    /// If the current token opens a structure, moves to the token closing it.
    /// Otherwise does nothing.
    fn skip_children(&mut self) -> Result<(), TokenError> {
        match self.kind() {
            Some(kind) if kind.is_structure_start() => {}
            _ => return Ok(()),
        }
        let outer = self.depth() - 1;
        loop {
            let kind = self.next_kind("the end of the skipped structure")?;
            if kind.is_structure_end() && self.depth() == outer {
                return Ok(());
            }
        }
    }
}

impl<R: TokenReader + ?Sized> TokenReader for &mut R {
    #[inline]
    fn current(&self) -> Option<&Token> {
        (**self).current()
    }

    #[inline]
    fn advance(&mut self) -> Result<Option<TokenKind>, TokenError> {
        (**self).advance()
    }

    #[inline]
    fn depth(&self) -> usize {
        (**self).depth()
    }

    #[inline]
    fn path(&self) -> DocumentPath {
        (**self).path()
    }

    #[inline]
    fn native_object_id(&self) -> Option<&Token> {
        (**self).native_object_id()
    }
}

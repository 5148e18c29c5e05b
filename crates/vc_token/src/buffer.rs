use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::TokenError;
use crate::path::{DocumentPath, PathTracker};
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};
use crate::writer::TokenWriter;

// -----------------------------------------------------------------------------
// TokenBuffer

/// An in-memory token sequence.
///
/// As a [`TokenWriter`] it captures tokens and checks that structures are
/// closed in order. [`TokenBuffer::reader`] replays the captured tokens.
///
/// # Examples
///
/// ```
/// use vc_token::{TokenBuffer, TokenReader, TokenWriter};
///
/// let mut buffer = TokenBuffer::new();
/// buffer.write_start_object().unwrap();
/// buffer.write_string_field("name", "Bob").unwrap();
/// buffer.write_end_object().unwrap();
/// assert!(buffer.is_complete());
///
/// let mut reader = buffer.reader();
/// reader.advance().unwrap();
/// assert_eq!(reader.field_name(), Some("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    object_ids: BTreeMap<usize, Token>,
    pending_id: Option<Token>,
    open: Vec<TokenKind>,
}

impl TokenBuffer {
    #[inline]
    pub const fn new() -> Self {
        Self {
            tokens: Vec::new(),
            object_ids: BTreeMap::new(),
            pending_id: None,
            open: Vec::new(),
        }
    }

    /// Wraps an existing token sequence without validating it.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Self::new()
        }
    }

    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns `true` if every written structure has been closed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.open.is_empty()
    }

    /// Attaches a native identity to the next `StartObject` written.
    ///
    /// Readers report it through [`TokenReader::native_object_id`].
    #[inline]
    pub fn annotate_object_id(&mut self, id: Token) {
        self.pending_id = Some(id);
    }

    /// Creates a reader positioned on the first token.
    #[inline]
    pub fn reader(&self) -> BufferReader<'_> {
        BufferReader::new(self, DocumentPath::root())
    }

    /// Creates a reader whose reported paths are prefixed by `base`.
    ///
    /// Used when replaying a capture taken from the middle of a document.
    #[inline]
    pub fn reader_at(&self, base: DocumentPath) -> BufferReader<'_> {
        BufferReader::new(self, base)
    }
}

impl TokenWriter for TokenBuffer {
    fn write_token(&mut self, token: Token) -> Result<(), TokenError> {
        let kind = token.kind();
        match kind {
            TokenKind::StartObject | TokenKind::StartArray => {
                if kind == TokenKind::StartObject
                    && let Some(id) = self.pending_id.take()
                {
                    self.object_ids.insert(self.tokens.len(), id);
                }
                self.open.push(kind);
            }
            TokenKind::EndObject => {
                if self.open.last() != Some(&TokenKind::StartObject) {
                    return Err(TokenError::Unbalanced { found: kind });
                }
                self.open.pop();
            }
            TokenKind::EndArray => {
                if self.open.last() != Some(&TokenKind::StartArray) {
                    return Err(TokenError::Unbalanced { found: kind });
                }
                self.open.pop();
            }
            TokenKind::FieldName => {
                if self.open.last() != Some(&TokenKind::StartObject) {
                    return Err(TokenError::Unbalanced { found: kind });
                }
            }
            _ => {}
        }
        self.tokens.push(token);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// BufferReader

/// A [`TokenReader`] replaying a [`TokenBuffer`].
#[derive(Debug, Clone)]
pub struct BufferReader<'a> {
    buffer: &'a TokenBuffer,
    position: usize,
    tracker: PathTracker,
}

impl<'a> BufferReader<'a> {
    fn new(buffer: &'a TokenBuffer, base: DocumentPath) -> Self {
        let mut tracker = PathTracker::new(base);
        if let Some(first) = buffer.tokens.first() {
            tracker.on_token(first);
        }
        Self {
            buffer,
            position: 0,
            tracker,
        }
    }

    /// Index of the current token in the underlying buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}

impl TokenReader for BufferReader<'_> {
    #[inline]
    fn current(&self) -> Option<&Token> {
        self.buffer.tokens.get(self.position)
    }

    fn advance(&mut self) -> Result<Option<TokenKind>, TokenError> {
        if self.position >= self.buffer.tokens.len() {
            return Ok(None);
        }
        self.position += 1;
        match self.buffer.tokens.get(self.position) {
            Some(token) => {
                self.tracker.on_token(token);
                Ok(Some(token.kind()))
            }
            None => Ok(None),
        }
    }

    #[inline]
    fn depth(&self) -> usize {
        self.tracker.depth()
    }

    #[inline]
    fn path(&self) -> DocumentPath {
        self.tracker.path()
    }

    #[inline]
    fn native_object_id(&self) -> Option<&Token> {
        self.buffer.object_ids.get(&self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    fn sample() -> TokenBuffer {
        TokenBuffer::from_tokens(vec![
            Token::StartObject,
            Token::field("a"),
            Token::StartObject,
            Token::field("x"),
            Token::Null,
            Token::EndObject,
            Token::field("b"),
            Token::Bool(true),
            Token::EndObject,
        ])
    }

    #[test]
    fn unbalanced_writes_fail() {
        let mut buffer = TokenBuffer::new();
        assert!(buffer.write_end_object().is_err());
        assert!(buffer.write_field_name("a").is_err());
        buffer.write_start_array().unwrap();
        assert!(buffer.write_end_object().is_err());
        buffer.write_end_array().unwrap();
        assert!(buffer.is_complete());
    }

    #[test]
    fn reader_walks_and_reports_end() {
        let buffer = sample();
        let mut reader = buffer.reader();
        let mut count = 1;
        while reader.advance().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, buffer.len());
        assert_eq!(reader.current(), None);
        assert_eq!(reader.advance().unwrap(), None);
        assert!(matches!(
            reader.next_kind("more"),
            Err(TokenError::UnexpectedEnd { expected: "more" })
        ));
    }

    #[test]
    fn skip_children_stops_on_matching_end() {
        let buffer = sample();
        let mut reader = buffer.reader();
        reader.advance().unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.depth(), 2);
        reader.skip_children().unwrap();
        assert_eq!(reader.kind(), Some(TokenKind::EndObject));
        assert_eq!(reader.depth(), 1);
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn copy_structure_from_field() {
        let buffer = sample();
        let mut reader = buffer.reader();
        reader.advance().unwrap();

        let mut copy = TokenBuffer::new();
        copy.write_start_object().unwrap();
        copy.copy_current_structure(&mut reader).unwrap();
        copy.write_end_object().unwrap();

        assert_eq!(reader.position(), 5);
        assert_eq!(
            copy.tokens(),
            &[
                Token::StartObject,
                Token::field("a"),
                Token::StartObject,
                Token::field("x"),
                Token::Null,
                Token::EndObject,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn base_path_and_native_ids() {
        let mut buffer = TokenBuffer::new();
        buffer.annotate_object_id(Token::from("ref-1"));
        buffer.write_start_object().unwrap();
        buffer.write_field_name("v").unwrap();
        buffer.write_null().unwrap();
        buffer.write_end_object().unwrap();

        let base = DocumentPath::root().join(crate::PathSegment::Field("outer".into()));
        let mut reader = buffer.reader_at(base);
        assert_eq!(reader.native_object_id(), Some(&Token::from("ref-1")));
        reader.advance().unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.native_object_id(), None);
        assert_eq!(reader.path().to_string(), "/outer/v");
    }
}

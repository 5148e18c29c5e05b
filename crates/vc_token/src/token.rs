use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use serde_json::Number;

// -----------------------------------------------------------------------------
// Embedded

/// An opaque value carried through the stream without being tokenized.
///
/// Two embedded values are equal only when they share the same allocation.
#[derive(Clone)]
pub struct Embedded(Arc<dyn Any + Send + Sync>);

impl Embedded {
    /// Wraps a value.
    #[inline]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps an already shared value.
    #[inline]
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    /// Returns the inner value if it has type `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns the shared handle.
    #[inline]
    pub fn as_arc(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.0
    }
}

impl PartialEq for Embedded {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Embedded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Embedded(..)")
    }
}

// -----------------------------------------------------------------------------
// Token

/// A single event of a JSON-like document.
///
/// Object members are encoded as a [`Token::FieldName`] followed by the
/// tokens of the member value.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    String(String),
    Number(Number),
    Bool(bool),
    Null,
    Embedded(Embedded),
}

impl Token {
    /// Returns the payload-free kind of this token.
    #[inline]
    pub const fn kind(&self) -> TokenKind {
        match self {
            Token::StartObject => TokenKind::StartObject,
            Token::EndObject => TokenKind::EndObject,
            Token::StartArray => TokenKind::StartArray,
            Token::EndArray => TokenKind::EndArray,
            Token::FieldName(_) => TokenKind::FieldName,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::Bool(_) => TokenKind::Bool,
            Token::Null => TokenKind::Null,
            Token::Embedded(_) => TokenKind::Embedded,
        }
    }

    /// Creates a field name token.
    #[inline]
    pub fn field(name: impl Into<String>) -> Self {
        Token::FieldName(name.into())
    }

    /// Creates a string token.
    #[inline]
    pub fn string(value: impl Into<String>) -> Self {
        Token::String(value.into())
    }
}

impl From<i64> for Token {
    #[inline]
    fn from(value: i64) -> Self {
        Token::Number(Number::from(value))
    }
}

impl From<u64> for Token {
    #[inline]
    fn from(value: u64) -> Self {
        Token::Number(Number::from(value))
    }
}

impl From<bool> for Token {
    #[inline]
    fn from(value: bool) -> Self {
        Token::Bool(value)
    }
}

impl From<&str> for Token {
    #[inline]
    fn from(value: &str) -> Self {
        Token::String(value.into())
    }
}

// -----------------------------------------------------------------------------
// TokenKind

/// The kind of a [`Token`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName,
    String,
    Number,
    Bool,
    Null,
    Embedded,
}

impl TokenKind {
    /// Returns `true` for tokens that are a complete value on their own.
    #[inline]
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::Bool | Self::Null | Self::Embedded
        )
    }

    /// Returns `true` for `StartObject` and `StartArray`.
    #[inline]
    pub const fn is_structure_start(self) -> bool {
        matches!(self, Self::StartObject | Self::StartArray)
    }

    /// Returns `true` for `EndObject` and `EndArray`.
    #[inline]
    pub const fn is_structure_end(self) -> bool {
        matches!(self, Self::EndObject | Self::EndArray)
    }

    /// Returns `true` if a value ends on this token.
    ///
    /// After a value has been read completely, the reader sits on one of these.
    #[inline]
    pub const fn is_value_end(self) -> bool {
        self.is_scalar() || self.is_structure_end()
    }

    /// A short human readable name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartObject => "START_OBJECT",
            Self::EndObject => "END_OBJECT",
            Self::StartArray => "START_ARRAY",
            Self::EndArray => "END_ARRAY",
            Self::FieldName => "FIELD_NAME",
            Self::String => "VALUE_STRING",
            Self::Number => "VALUE_NUMBER",
            Self::Bool => "VALUE_BOOLEAN",
            Self::Null => "VALUE_NULL",
            Self::Embedded => "VALUE_EMBEDDED_OBJECT",
        }
    }
}

impl fmt::Display for TokenKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use alloc::string::String;
use core::fmt;

use vc_token::{Token, TokenReader, TokenWriter, json};

use crate::error::Error;

// -----------------------------------------------------------------------------
// IdKey

/// The value of an object identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdKey {
    Int(i64),
    Str(String),
}

impl IdKey {
    /// Converts a scalar token into an identity.
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Number(number) => number.as_i64().map(IdKey::Int),
            Token::String(text) => Some(IdKey::Str(text.clone())),
            _ => None,
        }
    }

    /// Reads the identity under the reader without moving it.
    pub fn read(reader: &dyn TokenReader) -> Result<Self, Error> {
        reader
            .current()
            .and_then(IdKey::from_token)
            .ok_or_else(|| Error::invalid_value("an object id", json::describe_current(reader)))
    }

    /// Writes the identity as a scalar.
    pub fn write(&self, writer: &mut dyn TokenWriter) -> Result<(), Error> {
        match self {
            IdKey::Int(value) => writer.write_token(Token::from(*value))?,
            IdKey::Str(text) => writer.write_string(text)?,
        }
        Ok(())
    }
}

impl fmt::Display for IdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKey::Int(value) => write!(f, "{value}"),
            IdKey::Str(text) => write!(f, "{text:?}"),
        }
    }
}

// -----------------------------------------------------------------------------
// IdentityPolicy

/// Where the identity of a bean comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// A sequence number generated while encoding, written as an extra
    /// leading field with this name.
    Generated(&'static str),
    /// The value of a declared scalar property.
    Property(&'static str),
}

/// Object identity settings of a bean type.
///
/// The first occurrence of an object is written in full; later occurrences
/// of the same object are written as its bare id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPolicy {
    pub source: IdSource,
    /// Write every occurrence, including the first, as the bare id.
    pub always_as_id: bool,
}

impl IdentityPolicy {
    /// Name of the field carrying the identity.
    #[inline]
    pub fn property_name(&self) -> &'static str {
        match self.source {
            IdSource::Generated(name) | IdSource::Property(name) => name,
        }
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        matches!(self.source, IdSource::Generated(_))
    }
}

use alloc::string::String;

use thiserror::Error;

use crate::token::TokenKind;

// -----------------------------------------------------------------------------
// TokenError

/// Failure of a token stream operation.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TokenError {
    #[error("unexpected end-of-input: expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unexpected token {found}: expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
    },

    #[error("unbalanced token {found} at this position")]
    Unbalanced { found: TokenKind },

    #[error("malformed document: {0}")]
    Syntax(String),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl TokenError {
    /// Builds the error for `found` (or end-of-input) where `expected` was required.
    #[inline]
    pub fn unexpected(expected: &'static str, found: Option<TokenKind>) -> Self {
        match found {
            Some(found) => Self::UnexpectedToken { expected, found },
            None => Self::UnexpectedEnd { expected },
        }
    }
}

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;
use vc_token::{DocumentPath, TokenError};

// -----------------------------------------------------------------------------
// Reference

/// One link of the reference chain attached to an [`Error`].
///
/// Displayed as `User["address"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub bean_type: &'static str,
    pub property: Cow<'static, str>,
}

impl fmt::Display for Reference {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[\"{}\"]", self.bean_type, self.property)
    }
}

struct Chain<'a>(&'a [Reference]);

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str(" (through reference chain: ")?;
        for (index, reference) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("->")?;
            }
            write!(f, "{reference}")?;
        }
        f.write_str(")")
    }
}

struct At<'a>(&'a Option<DocumentPath>);

impl fmt::Display for At<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, " at {path}"),
            None => Ok(()),
        }
    }
}

// -----------------------------------------------------------------------------
// ErrorKind

/// The category of an [`Error`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The token stream is not in the state the mapper requires.
    #[error(transparent)]
    Structural(#[from] TokenError),

    #[error("cannot map {found} into {expected}")]
    InvalidValue {
        expected: &'static str,
        found: String,
    },

    /// A failure while assigning (or reading) one named property.
    #[error("problem with property \"{property}\" of `{bean_type}`{}: {cause}", At(.location))]
    PropertyAssignment {
        bean_type: &'static str,
        property: Cow<'static, str>,
        location: Option<DocumentPath>,
        #[source]
        cause: Box<ErrorKind>,
    },

    #[error("unrecognized property \"{property}\" of `{bean_type}`")]
    UnknownProperty {
        bean_type: &'static str,
        property: String,
    },

    #[error("cannot construct instance of `{bean_type}`: {message}")]
    Construction {
        bean_type: &'static str,
        message: String,
    },

    #[error("cannot resolve subtype {type_id:?} of `{base_type}`")]
    UnresolvableType {
        base_type: &'static str,
        type_id: Option<String>,
    },

    #[error("missing type id property \"{type_property}\" for property \"{property}\"")]
    MissingTypeId {
        property: &'static str,
        type_property: &'static str,
    },

    #[error("recursion limit ({limit}) exhausted, possibly a cyclic object graph")]
    RecursionExhausted { limit: usize },

    #[error("unresolved object reference {id}")]
    UnresolvedReference { id: String },

    #[error("type `{type_name}` is not registered")]
    Unregistered { type_name: &'static str },

    #[error("no property filter registered with id \"{id}\"")]
    UnknownFilter { id: &'static str },

    #[error("advice desynchronized the token stream at property \"{property}\" of `{bean_type}`")]
    AdviceDesync {
        bean_type: &'static str,
        property: String,
    },

    #[error("{0}")]
    Custom(String),
}

impl ErrorKind {
    /// Kinds raised at the point of failure, turned into
    /// [`ErrorKind::PropertyAssignment`] by the property that encloses them.
    #[inline]
    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Structural(_)
                | Self::InvalidValue { .. }
                | Self::UnknownProperty { .. }
                | Self::UnresolvedReference { .. }
                | Self::Custom(_)
        )
    }
}

// -----------------------------------------------------------------------------
// Error

/// Error of a decode or encode operation.
///
/// Carries an [`ErrorKind`] and the chain of bean properties, from the root
/// object inwards, that was being processed when it happened.
#[derive(Debug, Error)]
#[error("{kind}{}", Chain(.path))]
pub struct Error {
    kind: Box<ErrorKind>,
    path: Vec<Reference>,
}

impl Error {
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
            path: Vec::new(),
        }
    }

    /// Creates an [`ErrorKind::Custom`] error.
    ///
    /// Advice and creators use this to report their own failures.
    #[inline]
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Custom(message.to_string()))
    }

    #[inline]
    pub fn invalid_value(expected: &'static str, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue {
            expected,
            found: found.into(),
        })
    }

    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[inline]
    pub fn into_kind(self) -> ErrorKind {
        *self.kind
    }

    /// The reference chain, outermost first.
    #[inline]
    pub fn path(&self) -> &[Reference] {
        &self.path
    }

    /// Attaches the property being processed when this error occurred.
    ///
    /// A leaf error becomes an [`ErrorKind::PropertyAssignment`]; every error
    /// gains a [`Reference`] at the front of its chain.
    pub fn at_property(
        mut self,
        bean_type: &'static str,
        property: impl Into<Cow<'static, str>>,
        location: Option<DocumentPath>,
    ) -> Self {
        let property = property.into();
        if self.path.is_empty() && self.kind.is_leaf() {
            let cause = core::mem::replace(&mut *self.kind, ErrorKind::Custom(String::new()));
            *self.kind = ErrorKind::PropertyAssignment {
                bean_type,
                property: property.clone(),
                location,
                cause: Box::new(cause),
            };
        }
        self.path.insert(
            0,
            Reference {
                bean_type,
                property,
            },
        );
        self
    }

    /// Reports a creator failure as [`ErrorKind::Construction`].
    pub(crate) fn into_construction(self, bean_type: &'static str) -> Self {
        match *self.kind {
            ErrorKind::Custom(message) => Self::new(ErrorKind::Construction { bean_type, message }),
            ErrorKind::InvalidValue { expected, found } => Self::new(ErrorKind::Construction {
                bean_type,
                message: alloc::format!("cannot map {found} into {expected}"),
            }),
            kind => Self {
                kind: Box::new(kind),
                path: self.path,
            },
        }
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<TokenError> for Error {
    #[inline]
    fn from(error: TokenError) -> Self {
        Self::new(ErrorKind::Structural(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_token::PathSegment;

    #[test]
    fn leaf_becomes_assignment_once() {
        let location = DocumentPath::root().join(PathSegment::Field("zip".into()));
        let error = Error::invalid_value("i32", "\"abc\"")
            .at_property("Address", "zip", Some(location))
            .at_property("User", "address", None);

        let ErrorKind::PropertyAssignment {
            bean_type,
            property,
            cause,
            ..
        } = error.kind()
        else {
            panic!("unexpected kind {:?}", error.kind());
        };
        assert_eq!(*bean_type, "Address");
        assert_eq!(property, "zip");
        assert!(matches!(**cause, ErrorKind::InvalidValue { .. }));
        assert_eq!(error.path().len(), 2);
        assert_eq!(
            error.to_string(),
            "problem with property \"zip\" of `Address` at /zip: cannot map \"abc\" into i32 \
             (through reference chain: User[\"address\"]->Address[\"zip\"])"
        );
    }

    #[test]
    fn structured_kinds_keep_their_kind() {
        let error = Error::new(ErrorKind::RecursionExhausted { limit: 4 })
            .at_property("Node", "next", None);
        assert!(matches!(error.kind(), ErrorKind::RecursionExhausted { limit: 4 }));
        assert_eq!(error.path()[0].to_string(), "Node[\"next\"]");
    }

    #[test]
    fn creator_failures_become_construction() {
        let error = Error::custom("negative radius").into_construction("Circle");
        assert!(matches!(
            error.kind(),
            ErrorKind::Construction { bean_type: "Circle", .. }
        ));
    }
}

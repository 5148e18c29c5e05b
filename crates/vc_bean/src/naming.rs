use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;

// -----------------------------------------------------------------------------
// NameTransformer

/// Renames the fields of an unwrapped child by adding a prefix and suffix.
///
/// # Examples
///
/// ```
/// use vc_bean::NameTransformer;
///
/// let t = NameTransformer::prefixed("home_");
/// assert_eq!(t.transform("street"), "home_street");
/// assert_eq!(t.reverse("home_street"), Some("street"));
/// assert_eq!(t.reverse("street"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NameTransformer {
    prefix: String,
    suffix: String,
}

impl NameTransformer {
    /// The identity transformer.
    #[inline]
    pub const fn none() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    #[inline]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    #[inline]
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self::new(prefix, "")
    }

    #[inline]
    pub fn suffixed(suffix: impl Into<String>) -> Self {
        Self::new("", suffix)
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// Maps a property name to the name used in the document.
    pub fn transform<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.is_none() {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(format!("{}{name}{}", self.prefix, self.suffix))
        }
    }

    /// Maps a document name back to a property name.
    ///
    /// Returns `None` if `name` was not produced by this transformer.
    pub fn reverse<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }

    /// Combines with a transformer applied first, before `self`.
    pub fn wrap(&self, inner: &NameTransformer) -> Self {
        Self {
            prefix: format!("{}{}", self.prefix, inner.prefix),
            suffix: format!("{}{}", inner.suffix, self.suffix),
        }
    }
}

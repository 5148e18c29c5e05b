use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::token::Token;

// -----------------------------------------------------------------------------
// PathSegment

/// One step of a [`DocumentPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A member of an object.
    Field(String),
    /// An element of an array.
    Index(usize),
}

// -----------------------------------------------------------------------------
// DocumentPath

/// Location of a token inside a document.
///
/// Displayed in JSON pointer form, e.g. `/address/lines/0`. The root is `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<PathSegment>,
}

impl DocumentPath {
    /// The empty (root) path.
    #[inline]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.segments.push(segment);
        path
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => {
                    f.write_str("/")?;
                    for ch in name.chars() {
                        match ch {
                            '~' => f.write_str("~0")?,
                            '/' => f.write_str("~1")?,
                            _ => fmt::Write::write_char(f, ch)?,
                        }
                    }
                }
                PathSegment::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// PathTracker

#[derive(Debug, Clone)]
enum Frame {
    Object(Option<String>),
    Array(Option<usize>),
}

/// Nesting state of a token reader.
///
/// Readers feed every token they move onto into [`PathTracker::on_token`],
/// and derive their depth and path from it.
///
/// The depth counts open structures: a `StartObject` token is already inside
/// the object it opens, and its `EndObject` token is back outside of it.
#[derive(Debug, Clone, Default)]
pub struct PathTracker {
    base: DocumentPath,
    frames: Vec<Frame>,
}

impl PathTracker {
    /// Creates a tracker whose paths are reported relative to `base`.
    #[inline]
    pub fn new(base: DocumentPath) -> Self {
        Self {
            base,
            frames: Vec::new(),
        }
    }

    /// Current nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Updates the nesting state for a token that became current.
    pub fn on_token(&mut self, token: &Token) {
        match token {
            Token::StartObject => {
                self.next_element();
                self.frames.push(Frame::Object(None));
            }
            Token::StartArray => {
                self.next_element();
                self.frames.push(Frame::Array(None));
            }
            Token::EndObject | Token::EndArray => {
                self.frames.pop();
            }
            Token::FieldName(name) => {
                if let Some(Frame::Object(field)) = self.frames.last_mut() {
                    *field = Some(name.clone());
                }
            }
            _ => self.next_element(),
        }
    }

    fn next_element(&mut self) {
        if let Some(Frame::Array(index)) = self.frames.last_mut() {
            *index = Some(index.map_or(0, |i| i + 1));
        }
    }

    /// Path of the current token.
    pub fn path(&self) -> DocumentPath {
        let mut path = self.base.clone();
        for frame in &self.frames {
            match frame {
                Frame::Object(Some(name)) => path.push(PathSegment::Field(name.clone())),
                Frame::Array(Some(index)) => path.push(PathSegment::Index(*index)),
                _ => {}
            }
        }
        path
    }
}

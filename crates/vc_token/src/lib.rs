#![doc = include_str!("../README.md")]
#![no_std]

// -----------------------------------------------------------------------------
// Compilation config

/// Some macros used for compilation control.
pub mod cfg {
    vc_cfg::define_alias! {
        #[cfg(feature = "std")] => std,
    }
}

// -----------------------------------------------------------------------------
// no_std support

crate::cfg::std! {
    extern crate std;
}

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod buffer;
mod error;
mod path;
mod reader;
mod serde;
mod token;
mod writer;

pub mod json;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use buffer::{BufferReader, TokenBuffer};
pub use error::TokenError;
pub use path::{DocumentPath, PathSegment, PathTracker};
pub use reader::TokenReader;
pub use token::{Embedded, Token, TokenKind};
pub use writer::TokenWriter;

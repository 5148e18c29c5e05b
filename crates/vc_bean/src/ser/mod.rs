//! Encoding beans into token streams.

mod context;
mod encoder;

pub use context::EncodeContext;
pub use encoder::BeanEncoder;

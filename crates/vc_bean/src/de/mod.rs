//! Decoding beans from token streams.

mod context;
mod decoder;
mod external;

pub use context::{DecodeContext, Decoded};
pub use decoder::BeanDecoder;

#[cfg(test)]
mod tests;

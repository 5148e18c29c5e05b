#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_bean as bean;
pub use vc_cfg as cfg;
pub use vc_token as token;

/// Version of the `vc_databind` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

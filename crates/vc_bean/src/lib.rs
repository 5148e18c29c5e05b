#![doc = include_str!("../README.md")]
#![no_std]

// -----------------------------------------------------------------------------
// Compilation config

/// Some macros used for compilation control.
pub mod cfg {
    vc_cfg::define_alias! {
        #[cfg(feature = "std")] => std,
        #[cfg(all(debug_assertions, feature = "debug"))] => debug,
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

mod codec;
mod config;
mod error;
mod identity;
mod impls;
mod mapper;
mod naming;

pub mod advice;
pub mod de;
pub mod hash;
pub mod registry;
pub mod ser;

#[cfg(test)]
mod fixtures;

#[doc(hidden)]
pub mod __macro_exports {
    pub use vc_token::{TokenReader, TokenWriter};
}

// -----------------------------------------------------------------------------
// Top-Level exports

pub use advice::{AdviceBinding, DeserializerAdvice, SerializerAdvice};
pub use codec::Codec;
pub use config::{MapperConfig, PropertyFilter, SimplePropertyFilter, UnknownPropertyPolicy};
pub use de::{BeanDecoder, DecodeContext, Decoded};
pub use error::{Error, ErrorKind, Reference};
pub use identity::{IdKey, IdSource, IdentityPolicy};
pub use mapper::BeanMapper;
pub use naming::NameTransformer;
pub use registry::{
    Bean, BeanBox, BeanMeta, BeanMetaBuilder, BeanRegistry, ConstructionPlan, CreatorArgs,
    DecodePolicy, PropertyDescriptor, PropertyKind, Shape, Subtypes,
};
pub use ser::{BeanEncoder, EncodeContext};

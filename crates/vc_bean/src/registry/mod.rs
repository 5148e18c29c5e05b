//! Bean descriptions and the registry holding them.

mod bean_registry;
mod creator;
mod meta;
mod subtypes;

pub(crate) mod property;

pub use bean_registry::BeanRegistry;
pub use creator::{BeanBox, ConstructionPlan, CreatorArgs};
pub use meta::{Bean, BeanMeta, BeanMetaBuilder, DecodePolicy, Shape};
pub use property::{PropertyDescriptor, PropertyKind};
pub use subtypes::Subtypes;

pub(crate) use creator::ValueBuffer;

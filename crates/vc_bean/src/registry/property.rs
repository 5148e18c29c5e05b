use alloc::boxed::Box;
use core::any::{Any, type_name};
use core::fmt;

use vc_token::{TokenReader, TokenWriter};

use crate::codec::Codec;
use crate::de::{BeanDecoder, DecodeContext};
use crate::error::Error;
use crate::naming::NameTransformer;
use crate::registry::{Bean, BeanRegistry, Subtypes};
use crate::ser::{BeanEncoder, EncodeContext};

// -----------------------------------------------------------------------------
// Downcast helpers

pub(crate) fn bean_ref<T: Any>(bean: &dyn Any) -> Result<&T, Error> {
    bean.downcast_ref::<T>()
        .ok_or_else(|| Error::custom(format_args!("expected a bean of type `{}`", type_name::<T>())))
}

pub(crate) fn bean_mut<T: Any>(bean: &mut dyn Any) -> Result<&mut T, Error> {
    bean.downcast_mut::<T>()
        .ok_or_else(|| Error::custom(format_args!("expected a bean of type `{}`", type_name::<T>())))
}

// -----------------------------------------------------------------------------
// PropertyKind

/// How a property maps onto the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// A plain member, set after construction.
    Field,
    /// A parameter of the bean's creator, at position `index`.
    Creator { index: usize },
    /// A child bean whose fields are written inline into the parent.
    Unwrapped { transformer: NameTransformer },
    /// A polymorphic value whose subtype is named by a sibling field.
    External { type_property: &'static str },
}

// -----------------------------------------------------------------------------
// Accessors

pub(crate) trait ValueAccess: Send + Sync {
    fn decode_assign(
        &self,
        bean: &mut dyn Any,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error>;

    fn decode_boxed(
        &self,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>, Error>;

    fn encode(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error>;

    fn has_setter(&self) -> bool;
}

pub(crate) struct FieldAccess<T, V> {
    pub get: fn(&T) -> &V,
    pub set: Option<fn(&mut T, V)>,
}

impl<T: Bean, V: Codec> ValueAccess for FieldAccess<T, V> {
    fn decode_assign(
        &self,
        bean: &mut dyn Any,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let Some(set) = self.set else {
            reader.skip_children()?;
            return Ok(());
        };
        let value = V::decode(reader, ctx)?;
        set(bean_mut::<T>(bean)?, value);
        Ok(())
    }

    fn decode_boxed(
        &self,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>, Error> {
        Ok(Box::new(V::decode(reader, ctx)?))
    }

    fn encode(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        (self.get)(bean_ref::<T>(bean)?).encode(writer, ctx)
    }

    #[inline]
    fn has_setter(&self) -> bool {
        self.set.is_some()
    }
}

pub(crate) trait UnwrappedAccess: Send + Sync {
    fn decode(
        &self,
        bean: &mut dyn Any,
        transformer: NameTransformer,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error>;

    fn encode(
        &self,
        bean: &dyn Any,
        transformer: NameTransformer,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error>;
}

pub(crate) struct UnwrappedField<T, C> {
    pub get: fn(&T) -> &C,
    pub set: fn(&mut T, C),
}

impl<T: Bean, C: Bean> UnwrappedAccess for UnwrappedField<T, C> {
    fn decode(
        &self,
        bean: &mut dyn Any,
        transformer: NameTransformer,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = ctx.registry().require::<C>()?;
        let decoded = BeanDecoder::new(meta)
            .with_unwrapping(transformer)
            .decode(reader, ctx)?;
        let child = decoded.into_bean::<C>(meta)?;
        (self.set)(bean_mut::<T>(bean)?, child);
        Ok(())
    }

    fn encode(
        &self,
        bean: &dyn Any,
        transformer: NameTransformer,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = ctx.registry().require::<C>()?;
        let child = (self.get)(bean_ref::<T>(bean)?);
        BeanEncoder::new(meta)
            .with_unwrapping(transformer)
            .encode(child, writer, ctx)
    }
}

pub(crate) trait ExternalAccess: Send + Sync {
    fn decode(
        &self,
        bean: &mut dyn Any,
        type_id: &str,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error>;

    /// Returns the type id of the current value, or `None` if no subtype
    /// matches it.
    fn type_id_of(&self, bean: &dyn Any) -> Result<Option<&'static str>, Error>;

    fn encode(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error>;
}

pub(crate) struct ExternalField<T, V> {
    pub get: fn(&T) -> &V,
    pub set: fn(&mut T, V),
    pub subtypes: Subtypes<V>,
}

impl<T: Bean, V: Send + Sync + 'static> ExternalAccess for ExternalField<T, V> {
    fn decode(
        &self,
        bean: &mut dyn Any,
        type_id: &str,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let value = self.subtypes.decode(type_id, reader, ctx)?;
        (self.set)(bean_mut::<T>(bean)?, value);
        Ok(())
    }

    fn type_id_of(&self, bean: &dyn Any) -> Result<Option<&'static str>, Error> {
        Ok(self.subtypes.type_id_of((self.get)(bean_ref::<T>(bean)?)))
    }

    fn encode(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        self.subtypes
            .encode((self.get)(bean_ref::<T>(bean)?), writer, ctx)
    }
}

pub(crate) enum Accessor {
    Value(Box<dyn ValueAccess>),
    Unwrapped(Box<dyn UnwrappedAccess>),
    External(Box<dyn ExternalAccess>),
}

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// One declared property of a bean.
///
/// Descriptors are created by [`BeanMetaBuilder`](crate::registry::BeanMetaBuilder)
/// and never change afterwards.
pub struct PropertyDescriptor {
    name: &'static str,
    index: usize,
    views: Option<Box<[&'static str]>>,
    kind: PropertyKind,
    pub(crate) accessor: Accessor,
}

impl PropertyDescriptor {
    pub(crate) fn new(name: &'static str, kind: PropertyKind, accessor: Accessor) -> Self {
        Self {
            name,
            index: 0,
            views: None,
            kind,
            accessor,
        }
    }

    /// Name of the property in the document.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Position in declaration order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Views the property belongs to; `None` means every view.
    #[inline]
    pub fn views(&self) -> Option<&[&'static str]> {
        self.views.as_deref()
    }

    /// Position among the creator parameters, if this is one.
    #[inline]
    pub fn creator_index(&self) -> Option<usize> {
        match self.kind {
            PropertyKind::Creator { index } => Some(index),
            _ => None,
        }
    }

    /// Returns `true` if the property takes part in `view`.
    ///
    /// Without an active view every property is visible.
    #[inline]
    pub fn is_visible_in(&self, view: Option<&str>) -> bool {
        match (view, &self.views) {
            (Some(view), Some(views)) => views.contains(&view),
            _ => true,
        }
    }

    /// Returns `true` if a decoded value can be stored into the bean.
    #[inline]
    pub fn is_writable(&self) -> bool {
        match &self.accessor {
            Accessor::Value(access) => access.has_setter(),
            Accessor::Unwrapped(_) | Accessor::External(_) => true,
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn set_views(&mut self, views: Box<[&'static str]>) {
        self.views = Some(views);
    }

    /// Writes the value of this property, without its field name.
    ///
    /// Only plain and creator properties have a standalone value; unwrapped
    /// and external properties are written by the encoder.
    pub fn write_value(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        match &self.accessor {
            Accessor::Value(access) => access.encode(bean, writer, ctx),
            _ => Err(Error::custom(format_args!(
                "property \"{}\" has no standalone value",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("views", &self.views)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Registration hook of a property whose value is a [`Codec`].
pub(crate) fn register_codec<V: Codec>(registry: &mut BeanRegistry) {
    V::register_types(registry);
}

/// Registration hook of a property whose value is a [`Bean`].
pub(crate) fn register_bean<B: Bean>(registry: &mut BeanRegistry) {
    registry.register::<B>();
}

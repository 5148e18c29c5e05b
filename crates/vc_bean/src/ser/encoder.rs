use alloc::borrow::Cow;
use core::any::Any;

use vc_token::{TokenBuffer, TokenWriter, json};

use crate::advice::ErasedSerializerAdvice;
use crate::error::{Error, ErrorKind};
use crate::identity::{IdKey, IdSource};
use crate::naming::NameTransformer;
use crate::registry::property::Accessor;
use crate::registry::{BeanMeta, PropertyDescriptor, PropertyKind, Shape};
use crate::ser::EncodeContext;

/// Name of the catch-all entries in reference chains.
const ANY_GETTER: &str = "[anySetter]";

// -----------------------------------------------------------------------------
// BeanEncoder

/// Encodes beans of one type into a token stream.
///
/// Properties are written in declaration order, skipping those outside the
/// active view or rejected by the bean's property filter. Beans with an
/// identity are written in full once per context and as their id afterwards.
#[derive(Debug, Clone)]
pub struct BeanEncoder<'m> {
    meta: &'m BeanMeta,
    unwrapping: Option<NameTransformer>,
}

impl<'m> BeanEncoder<'m> {
    #[inline]
    pub fn new(meta: &'m BeanMeta) -> Self {
        Self {
            meta,
            unwrapping: None,
        }
    }

    /// Writes the fields of the bean into the enclosing object, renamed by
    /// `transformer`, instead of writing an object of its own.
    #[inline]
    pub fn with_unwrapping(mut self, transformer: NameTransformer) -> Self {
        self.unwrapping = Some(transformer);
        self
    }

    #[inline]
    pub fn meta(&self) -> &'m BeanMeta {
        self.meta
    }

    /// Encodes `bean`, which must be of the type described by the encoder.
    pub fn encode(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        ctx.enter()?;
        let result = self.encode_value(bean, writer, ctx);
        ctx.leave();
        result
    }

    fn encode_value(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;
        if meta.shape() == Shape::Array && self.unwrapping.is_none() {
            return self.encode_array(bean, writer, ctx);
        }

        let mut leading = None;
        if let Some(policy) = meta.identity() {
            if let Some(key) = ctx.object_id(meta.type_id(), bean) {
                return key.write(writer);
            }
            let key = match policy.source {
                IdSource::Generated(_) => ctx.generate_id(),
                IdSource::Property(name) => self.property_id(bean, name, ctx)?,
            };
            ctx.remember(meta.type_id(), bean, key.clone());
            if policy.always_as_id {
                return key.write(writer);
            }
            leading = Some((policy.source.clone(), key));
        }

        if self.unwrapping.is_none() {
            writer.write_start_object()?;
        }
        // The identity always comes first, ahead of the declared order.
        let mut id_property = None;
        match leading {
            Some((IdSource::Generated(name), key)) => {
                writer.write_field_name(&self.field_name(name))?;
                key.write(writer)?;
            }
            Some((IdSource::Property(name), _)) => {
                if let Some(property) = meta.property(name) {
                    self.write_property(bean, property, writer, ctx)
                        .map_err(|e| e.at_property(meta.name(), name, None))?;
                    id_property = Some(name);
                }
            }
            None => {}
        }

        let advice = meta.advice.serializer.as_deref();
        let claimed = match advice {
            Some(advice) => {
                crate::cfg::debug! { log::trace!("`{}`: encode advice `intercept`", meta.name()); }
                advice.intercept(bean, writer, ctx)?
            }
            None => false,
        };
        if !claimed {
            if let Some(advice) = advice {
                advice.before(bean, writer, ctx)?;
            }
            self.write_properties(bean, id_property, advice, writer, ctx)?;
            self.write_any(bean, writer)?;
            if let Some(advice) = advice {
                advice.after(bean, writer, ctx)?;
            }
        }

        if self.unwrapping.is_none() {
            writer.write_end_object()?;
        }
        Ok(())
    }

    /// Writes the declared properties except `skip`, already written as the
    /// identity.
    fn write_properties(
        &self,
        bean: &dyn Any,
        skip: Option<&str>,
        advice: Option<&dyn ErasedSerializerAdvice>,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;
        let config = ctx.config();
        let filter = match meta.filter_id() {
            Some(id) => Some(config.filter(id).ok_or(ErrorKind::UnknownFilter { id })?),
            None => None,
        };
        let view = config.active_view();

        for property in meta.properties() {
            if skip == Some(property.name()) || !property.is_visible_in(view) {
                continue;
            }
            if let Some(filter) = filter
                && !filter.include(meta, property)
            {
                continue;
            }
            let wrap = |e: Error| e.at_property(meta.name(), property.name(), None);

            if let Some(advice) = advice {
                crate::cfg::debug! {
                    log::trace!("`{}`: encode advice for \"{}\"", meta.name(), property.name());
                }
                if advice
                    .intercept_property(bean, property, writer, ctx)
                    .map_err(wrap)?
                {
                    continue;
                }
                advice
                    .before_property(bean, property, writer, ctx)
                    .map_err(wrap)?;
            }
            self.write_property(bean, property, writer, ctx)
                .map_err(wrap)?;
            if let Some(advice) = advice {
                advice
                    .after_property(bean, property, writer, ctx)
                    .map_err(wrap)?;
            }
        }
        Ok(())
    }

    fn write_property(
        &self,
        bean: &dyn Any,
        property: &PropertyDescriptor,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        match (&property.accessor, property.kind()) {
            (Accessor::Value(access), _) => {
                writer.write_field_name(&self.field_name(property.name()))?;
                access.encode(bean, writer, ctx)
            }
            (Accessor::Unwrapped(access), PropertyKind::Unwrapped { transformer }) => {
                let transformer = match &self.unwrapping {
                    Some(outer) => outer.wrap(transformer),
                    None => transformer.clone(),
                };
                access.encode(bean, transformer, writer, ctx)
            }
            (Accessor::External(access), PropertyKind::External { type_property }) => {
                // A declared type property writes the type id itself.
                if self.meta.property(type_property).is_none() {
                    let Some(type_id) = access.type_id_of(bean)? else {
                        return Err(ErrorKind::UnresolvableType {
                            base_type: self.meta.name(),
                            type_id: None,
                        }
                        .into());
                    };
                    writer.write_string_field(&self.field_name(type_property), type_id)?;
                }
                writer.write_field_name(&self.field_name(property.name()))?;
                access.encode(bean, writer, ctx)
            }
            _ => Err(Error::custom(format_args!(
                "property \"{}\" has no encoder",
                property.name()
            ))),
        }
    }

    /// Writes the catch-all entries after the declared properties.
    fn write_any(&self, bean: &dyn Any, writer: &mut dyn TokenWriter) -> Result<(), Error> {
        let meta = self.meta;
        let Some(any) = meta.any() else {
            return Ok(());
        };
        let wrap = |e: Error| e.at_property(meta.name(), ANY_GETTER, None);
        let Some(entries) = any.get(bean).map_err(wrap)? else {
            return Ok(());
        };
        for (name, value) in entries {
            writer.write_field_name(&self.field_name(name))?;
            json::write_value(writer, value).map_err(|e| wrap(e.into()))?;
        }
        Ok(())
    }

    fn encode_array(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;
        writer.write_start_array()?;
        for property in meta.properties() {
            property
                .write_value(bean, writer, ctx)
                .map_err(|e| e.at_property(meta.name(), property.name(), None))?;
        }
        writer.write_end_array()?;
        Ok(())
    }

    /// Reads the identity of `bean` from its property `name`.
    fn property_id(
        &self,
        bean: &dyn Any,
        name: &'static str,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<IdKey, Error> {
        let Some(property) = self.meta.property(name) else {
            return Err(Error::custom(format_args!(
                "`{}` has no id property \"{name}\"",
                self.meta.name()
            )));
        };
        let mut buffer = TokenBuffer::new();
        property.write_value(bean, &mut buffer, ctx)?;
        let token = buffer.tokens().first();
        token.and_then(IdKey::from_token).ok_or_else(|| {
            Error::invalid_value(
                "an object id",
                token.map_or("nothing", |token| token.kind().name()),
            )
            .at_property(self.meta.name(), name, None)
        })
    }

    #[inline]
    fn field_name<'n>(&self, name: &'n str) -> Cow<'n, str> {
        match &self.unwrapping {
            Some(transformer) => transformer.transform(name),
            None => Cow::Borrowed(name),
        }
    }
}

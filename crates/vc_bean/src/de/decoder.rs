use alloc::string::{String, ToString};
use core::any::Any;

use vc_token::{DocumentPath, TokenBuffer, TokenError, TokenKind, TokenReader, TokenWriter, json};

use crate::config::UnknownPropertyPolicy;
use crate::de::external::ExternalTypeHandler;
use crate::de::{DecodeContext, Decoded};
use crate::error::{Error, ErrorKind};
use crate::identity::{IdKey, IdSource};
use crate::naming::NameTransformer;
use crate::registry::property::Accessor;
use crate::registry::{
    BeanMeta, ConstructionPlan, PropertyDescriptor, PropertyKind, Shape, ValueBuffer,
};

// -----------------------------------------------------------------------------
// ObjectState

/// Per-object state of a decode: the identity read so far and the fields
/// deferred to unwrapped and externally typed properties.
struct ObjectState {
    identity: Option<IdKey>,
    base: DocumentPath,
    external: Option<ExternalTypeHandler>,
    unwrapped: Option<TokenBuffer>,
}

impl ObjectState {
    fn new(meta: &BeanMeta, identity: Option<IdKey>, base: DocumentPath) -> Result<Self, Error> {
        let policy = meta.policy();
        let unwrapped = if policy.has_unwrapped {
            let mut capture = TokenBuffer::new();
            capture.write_start_object()?;
            Some(capture)
        } else {
            None
        };
        Ok(Self {
            identity,
            base,
            external: policy.has_external.then(|| ExternalTypeHandler::new(meta)),
            unwrapped,
        })
    }
}

// -----------------------------------------------------------------------------
// BeanDecoder

/// Decodes beans of one type from a token stream.
///
/// A single decoder covers every decode variant: plain beans, beans built by
/// a creator (fields arriving early are buffered and replayed), subtypes
/// produced by a creator, view filtering, unwrapped children, externally
/// typed properties and object identity. [`DecodePolicy`] flags of the bean
/// select the parts that take effect.
///
/// The reader starts on the first token of the bean (usually `StartObject`)
/// and is left on its last token. If decoding an object fails, the rest of
/// that object is consumed before the error is returned.
///
/// [`DecodePolicy`]: crate::registry::DecodePolicy
#[derive(Debug, Clone)]
pub struct BeanDecoder<'m> {
    meta: &'m BeanMeta,
    unwrapping: Option<NameTransformer>,
}

impl<'m> BeanDecoder<'m> {
    #[inline]
    pub fn new(meta: &'m BeanMeta) -> Self {
        Self {
            meta,
            unwrapping: None,
        }
    }

    /// Decodes the fields of an unwrapped child.
    ///
    /// Field names are mapped back through `transformer`; names it does not
    /// produce and unknown names are skipped.
    #[inline]
    pub fn with_unwrapping(mut self, transformer: NameTransformer) -> Self {
        self.unwrapping = Some(transformer);
        self
    }

    #[inline]
    pub fn meta(&self) -> &'m BeanMeta {
        self.meta
    }

    /// Decodes one bean.
    pub fn decode(
        &self,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Decoded, Error> {
        ctx.enter()?;
        let result = self.decode_value(reader, ctx);
        ctx.leave();
        let mut decoded = result?;
        decoded.bean = self.meta.upcast(decoded.bean)?;
        Ok(decoded)
    }

    /// Populates an existing bean from an object.
    ///
    /// The reader may be on the `StartObject` or already on the first field.
    pub fn decode_into(
        &self,
        bean: &mut dyn Any,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let mut base = reader.path();
        let open_depth = open_depth(reader);
        match reader.kind() {
            Some(TokenKind::StartObject) => {
                reader.next_kind("a field name or END_OBJECT")?;
            }
            Some(TokenKind::FieldName) => {
                base.pop();
            }
            Some(TokenKind::EndObject) => {}
            found => return Err(TokenError::unexpected("START_OBJECT", found).into()),
        }
        let mut state = ObjectState::new(self.meta, None, base)?;
        ctx.enter()?;
        let result = self.populate(bean, &mut state, reader, ctx);
        ctx.leave();
        if result.is_err() {
            self.resync(reader, open_depth);
        }
        result
    }

    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Decoded, Error> {
        let meta = self.meta;
        match reader.kind() {
            Some(TokenKind::StartObject) => {
                let identity = reader.native_object_id().and_then(IdKey::from_token);
                let open_depth = reader.depth();
                let base = reader.path();
                let result = match reader.next_kind("a field name or END_OBJECT") {
                    Ok(_) => self.decode_object(reader, ctx, identity, base),
                    Err(error) => Err(error.into()),
                };
                if result.is_err() {
                    self.resync(reader, open_depth);
                }
                result
            }
            Some(TokenKind::FieldName | TokenKind::EndObject) => {
                let mut base = reader.path();
                if reader.kind() == Some(TokenKind::FieldName) {
                    base.pop();
                }
                let open_depth = open_depth(reader);
                let result = self.decode_object(reader, ctx, None, base);
                if result.is_err() {
                    self.resync(reader, open_depth);
                }
                result
            }
            Some(TokenKind::StartArray) if meta.shape() == Shape::Array => {
                self.decode_array(reader, ctx)
            }
            Some(kind) if kind.is_scalar() => {
                match reader.current().and_then(|token| meta.from_scalar(token)) {
                    Some(result) => Ok(Decoded {
                        bean: result?,
                        identity: None,
                    }),
                    None => Err(Error::invalid_value(
                        meta.name(),
                        json::describe_current(reader),
                    )),
                }
            }
            found => Err(TokenError::unexpected("START_OBJECT", found).into()),
        }
    }

    /// Moves the reader to the `EndObject` closing the object opened at
    /// `open_depth`, or to the end of input.
    fn resync(&self, reader: &mut dyn TokenReader, open_depth: usize) {
        let outer = open_depth.saturating_sub(1);
        loop {
            if reader.kind() == Some(TokenKind::EndObject) && reader.depth() == outer {
                break;
            }
            match reader.advance() {
                Ok(Some(_)) => {}
                _ => break,
            }
        }
        log::debug!(
            "`{}`: skipped the rest of a failed object, now at {}",
            self.meta.name(),
            reader.path()
        );
    }

    fn decode_object(
        &self,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
        identity: Option<IdKey>,
        base: DocumentPath,
    ) -> Result<Decoded, Error> {
        if let Some(plan) = self.meta.creator() {
            return self.decode_buffered(plan, reader, ctx, identity, base);
        }
        let mut bean = self.meta.instantiate()?;
        let mut state = ObjectState::new(self.meta, identity, base)?;
        self.populate(&mut *bean, &mut state, reader, ctx)?;
        Ok(Decoded {
            bean,
            identity: state.identity,
        })
    }

    // -------------------------------------------------------------------------
    // Field loop

    /// Runs the field loop over an existing bean, with the reader on the first
    /// field or on `EndObject`. Leaves the reader on `EndObject`.
    fn populate(
        &self,
        bean: &mut dyn Any,
        state: &mut ObjectState,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;
        let advice = meta.advice.deserializer.as_deref();

        if let Some(advice) = advice {
            crate::cfg::debug! { log::trace!("`{}`: decode advice `before`", meta.name()); }
            advice.before(bean, &*reader, ctx)?;
        }

        while let Some(name) = reader.field_name().map(String::from) {
            let field_depth = reader.depth();
            reader.next_kind("a field value")?;
            self.handle_field(bean, &name, field_depth, state, reader, ctx)?;
            reader.next_kind("a field name or END_OBJECT")?;
        }
        reader.expect(TokenKind::EndObject, "a field name or END_OBJECT")?;

        self.complete(bean, state, ctx)?;

        if let Some(advice) = advice {
            crate::cfg::debug! { log::trace!("`{}`: decode advice `after`", meta.name()); }
            advice.after(bean, &*reader, ctx)?;
        }
        Ok(())
    }

    /// Handles one field, with the reader on the first token of its value.
    fn handle_field(
        &self,
        bean: &mut dyn Any,
        name: &str,
        field_depth: usize,
        state: &mut ObjectState,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;
        if let Some(advice) = meta.advice.deserializer.as_deref() {
            crate::cfg::debug! {
                log::trace!("`{}`: decode advice `intercept` for \"{name}\"", meta.name());
            }
            let claimed = advice
                .intercept(bean, name, reader, ctx)
                .map_err(|e| self.at(e, name, &*reader))?;
            if claimed {
                let in_sync = reader.depth() == field_depth
                    && reader.kind().is_some_and(TokenKind::is_value_end);
                if !in_sync {
                    return Err(ErrorKind::AdviceDesync {
                        bean_type: meta.name(),
                        property: name.to_string(),
                    }
                    .into());
                }
                return Ok(());
            }
        }
        self.dispatch(bean, name, state, reader, ctx)
    }

    /// Routes a field nobody intercepted to its single disposition.
    fn dispatch(
        &self,
        bean: &mut dyn Any,
        name: &str,
        state: &mut ObjectState,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;

        if self.is_generated_id(name) {
            let key = IdKey::read(&*reader).map_err(|e| self.at(e, name, &*reader))?;
            state.identity = Some(key);
            return Ok(());
        }

        let Some(local) = self.local_name(name) else {
            return self.unknown(bean, name, reader, ctx);
        };

        if let Some(property) = meta.property(local) {
            if self.is_property_id(local) {
                state.identity = reader.current().and_then(IdKey::from_token);
            }
            if let Some(external) = &mut state.external
                && reader.kind().is_some_and(TokenKind::is_scalar)
            {
                external
                    .handle_type_id(local, &*reader)
                    .map_err(|e| self.at(e, name, &*reader))?;
            }
            if !property.is_visible_in(ctx.config().active_view()) {
                log::trace!("`{}`: \"{name}\" is outside the active view", meta.name());
                reader.skip_children()?;
                return Ok(());
            }
            return self.assign(bean, property, reader, ctx);
        }

        if meta.is_ignorable(local) {
            log::trace!("`{}`: ignoring \"{name}\"", meta.name());
            reader.skip_children()?;
            return Ok(());
        }

        if let Some(external) = &mut state.external {
            if meta.is_type_property(local) {
                external
                    .handle_type_id(local, &*reader)
                    .map_err(|e| self.at(e, name, &*reader))?;
                return Ok(());
            }
            if external.capture_value(local, reader)? {
                return Ok(());
            }
        }

        if let Some(capture) = &mut state.unwrapped {
            capture.write_field_name(name)?;
            match meta.any().filter(|any| any.has_setter()) {
                Some(any) => {
                    let value = json::read_value(reader)?;
                    json::write_value(capture, &value)?;
                    any.set(bean, name.to_string(), value)
                        .map_err(|e| self.at(e, name, &*reader))?;
                }
                None => capture.copy_current_structure(reader)?,
            }
            return Ok(());
        }

        self.unknown(bean, name, reader, ctx)
    }

    fn assign(
        &self,
        bean: &mut dyn Any,
        property: &PropertyDescriptor,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let result = match &property.accessor {
            Accessor::Value(access) => access.decode_assign(bean, reader, ctx),
            _ => Err(Error::custom(format_args!(
                "property \"{}\" cannot be assigned on its own",
                property.name()
            ))),
        };
        result.map_err(|e| {
            e.at_property(self.meta.name(), property.name(), Some(reader.path()))
        })
    }

    /// Fallback for a field no property claims.
    fn unknown(
        &self,
        bean: &mut dyn Any,
        name: &str,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;
        if let Some(any) = meta.any().filter(|any| any.has_setter()) {
            let value = json::read_value(reader).map_err(|e| self.at(e.into(), name, &*reader))?;
            return any
                .set(bean, name.to_string(), value)
                .map_err(|e| self.at(e, name, &*reader));
        }
        let ignore = meta.ignores_unknown()
            || self.unwrapping.is_some()
            || ctx.config().unknown_properties() == UnknownPropertyPolicy::Ignore;
        if ignore {
            log::trace!("`{}`: ignoring unknown property \"{name}\"", meta.name());
            reader.skip_children()?;
            return Ok(());
        }
        let error = ErrorKind::UnknownProperty {
            bean_type: meta.name(),
            property: name.to_string(),
        };
        Err(self.at(error.into(), name, &*reader))
    }

    /// Decodes the deferred unwrapped and externally typed properties.
    fn complete(
        &self,
        bean: &mut dyn Any,
        state: &mut ObjectState,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        let meta = self.meta;
        if let Some(mut capture) = state.unwrapped.take() {
            capture.write_end_object()?;
            for property in meta.unwrapped_properties() {
                let (PropertyKind::Unwrapped { transformer }, Accessor::Unwrapped(access)) =
                    (property.kind(), &property.accessor)
                else {
                    continue;
                };
                let transformer = match &self.unwrapping {
                    Some(outer) => outer.wrap(transformer),
                    None => transformer.clone(),
                };
                let mut replay = capture.reader_at(state.base.clone());
                access
                    .decode(bean, transformer, &mut replay, ctx)
                    .map_err(|e| e.at_property(meta.name(), property.name(), None))?;
            }
        }
        if let Some(external) = state.external.take() {
            external.complete(meta, bean, ctx)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Creator

    /// Decodes a bean built by its creator.
    ///
    /// Creator parameters are decoded as they arrive; every other field is
    /// captured. Once all parameters are known (or the object ends) the bean
    /// is built, the rest of the object is captured, and the capture is
    /// replayed through the field loop of the built bean's own type.
    fn decode_buffered(
        &self,
        plan: &ConstructionPlan,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
        identity: Option<IdKey>,
        base: DocumentPath,
    ) -> Result<Decoded, Error> {
        let meta = self.meta;
        let mut buffer = plan.buffer(meta.name());
        buffer.identity = identity;
        let mut capture = TokenBuffer::new();
        capture.write_start_object()?;
        let mut built = None;

        while let Some(name) = reader.field_name().map(String::from) {
            reader.next_kind("a field value")?;
            let param = match built {
                Some(_) => None,
                None => self.creator_property(&name),
            };
            if let Some(property) = param {
                let local = property.name();
                if meta.is_type_property(local) && reader.kind().is_some_and(TokenKind::is_scalar) {
                    capture.write_field_name(&name)?;
                    capture.copy_current_event(&*reader)?;
                }
                if self.is_property_id(local) {
                    buffer.identity = reader.current().and_then(IdKey::from_token);
                }
                if !property.is_visible_in(ctx.config().active_view()) {
                    reader.skip_children()?;
                } else if self.fill(&mut buffer, property, reader, ctx)? {
                    built = Some(
                        plan.build(&mut buffer)
                            .map_err(|e| e.into_construction(meta.name()))?,
                    );
                }
            } else if built.is_none() && self.is_generated_id(&name) {
                let key = IdKey::read(&*reader).map_err(|e| self.at(e, &name, &*reader))?;
                buffer.identity = Some(key);
            } else {
                capture.write_field_name(&name)?;
                capture.copy_current_structure(reader)?;
            }
            reader.next_kind("a field name or END_OBJECT")?;
        }
        reader.expect(TokenKind::EndObject, "a field name or END_OBJECT")?;
        capture.write_end_object()?;

        let mut bean = match built {
            Some(bean) => bean,
            None => plan
                .build(&mut buffer)
                .map_err(|e| e.into_construction(meta.name()))?,
        };

        let concrete = (*bean).type_id();
        let target = if concrete == meta.type_id() {
            meta
        } else {
            ctx.registry().get(concrete).ok_or_else(|| {
                Error::from(ErrorKind::UnresolvableType {
                    base_type: meta.name(),
                    type_id: None,
                })
            })?
        };

        let decoder = BeanDecoder {
            meta: target,
            unwrapping: self.unwrapping.clone(),
        };
        let mut state = ObjectState::new(target, buffer.identity.take(), base.clone())?;
        let mut replay = capture.reader_at(base);
        replay.next_kind("a field name or END_OBJECT")?;
        decoder.populate(&mut *bean, &mut state, &mut replay, ctx)?;

        Ok(Decoded {
            bean,
            identity: state.identity,
        })
    }

    /// Decodes a creator parameter. Returns `true` once all are present.
    fn fill(
        &self,
        buffer: &mut ValueBuffer,
        property: &PropertyDescriptor,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        let (Some(index), Accessor::Value(access)) = (property.creator_index(), &property.accessor)
        else {
            return Ok(buffer.is_complete());
        };
        let value = access.decode_boxed(reader, ctx).map_err(|e| {
            e.at_property(self.meta.name(), property.name(), Some(reader.path()))
        })?;
        Ok(buffer.assign(index, value))
    }

    // -------------------------------------------------------------------------
    // Array shape

    fn decode_array(
        &self,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Decoded, Error> {
        let meta = self.meta;
        let mut bean = meta.instantiate()?;
        let mut properties = meta.properties().iter();
        loop {
            let kind = reader.next_kind("an array element or END_ARRAY")?;
            if kind == TokenKind::EndArray {
                break;
            }
            let Some(property) = properties.next() else {
                return Err(TokenError::unexpected("END_ARRAY", Some(kind)).into());
            };
            self.assign(&mut *bean, property, reader, ctx)?;
        }
        Ok(Decoded {
            bean,
            identity: None,
        })
    }

    // -------------------------------------------------------------------------
    // Helpers

    #[inline]
    fn local_name<'n>(&self, name: &'n str) -> Option<&'n str> {
        match &self.unwrapping {
            Some(transformer) => transformer.reverse(name),
            None => Some(name),
        }
    }

    fn creator_property(&self, name: &str) -> Option<&'m PropertyDescriptor> {
        self.local_name(name)
            .and_then(|local| self.meta.property(local))
            .filter(|property| property.creator_index().is_some())
    }

    #[inline]
    fn is_generated_id(&self, name: &str) -> bool {
        matches!(
            self.meta.identity().map(|policy| &policy.source),
            Some(IdSource::Generated(id)) if *id == name
        )
    }

    #[inline]
    fn is_property_id(&self, local: &str) -> bool {
        matches!(
            self.meta.identity().map(|policy| &policy.source),
            Some(IdSource::Property(id)) if *id == local
        )
    }

    #[inline]
    fn at(&self, error: Error, name: &str, reader: &dyn TokenReader) -> Error {
        error.at_property(self.meta.name(), name.to_string(), Some(reader.path()))
    }
}

/// Depth of the object the reader is in or about to open.
///
/// A `StartObject` and the fields after it share the object's depth; its
/// `EndObject` sits one level out.
#[inline]
fn open_depth(reader: &dyn TokenReader) -> usize {
    match reader.kind() {
        Some(TokenKind::EndObject) => reader.depth() + 1,
        _ => reader.depth(),
    }
}

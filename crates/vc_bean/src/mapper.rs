use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId};

use vc_token::{TokenBuffer, TokenReader, TokenWriter, json};

use crate::config::MapperConfig;
use crate::de::{BeanDecoder, DecodeContext};
use crate::error::{Error, ErrorKind};
use crate::registry::{Bean, BeanBox, BeanRegistry};
use crate::ser::{BeanEncoder, EncodeContext};

// -----------------------------------------------------------------------------
// BeanMapper

/// Entry point for decoding and encoding beans.
///
/// A mapper pairs a shared registry with a configuration. It is cheap to
/// clone and can be used from several threads at once; every call runs with
/// a fresh context unless one is passed to a `*_with` method.
///
/// Top-level decodes leave the reader on the token after the decoded value.
///
/// # Examples
///
/// ```
/// use vc_bean::{Bean, BeanMapper, BeanMeta, BeanRegistry};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Bean for Point {
///     fn describe() -> BeanMeta {
///         BeanMeta::builder::<Self>("Point")
///             .with_default()
///             .field("x", |p| &p.x, |p, v| p.x = v)
///             .field("y", |p| &p.y, |p, v| p.y = v)
///             .build()
///     }
/// }
///
/// let mut registry = BeanRegistry::new();
/// registry.register::<Point>();
/// let mapper = BeanMapper::new(registry);
///
/// let point: Point = mapper.from_json(r#"{"y":2,"x":1}"#).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// assert_eq!(mapper.to_json(&point).unwrap(), r#"{"x":1,"y":2}"#);
/// ```
#[derive(Debug, Clone)]
pub struct BeanMapper {
    registry: Arc<BeanRegistry>,
    config: Arc<MapperConfig>,
}

impl BeanMapper {
    #[inline]
    pub fn new(registry: BeanRegistry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    /// Creates a mapper over a registry shared with other mappers.
    #[inline]
    pub fn from_shared(registry: Arc<BeanRegistry>) -> Self {
        Self {
            registry,
            config: Arc::new(MapperConfig::default()),
        }
    }

    #[inline]
    pub fn registry(&self) -> &BeanRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Returns a mapper over the same registry with another configuration.
    #[inline]
    pub fn with_config(&self, config: MapperConfig) -> Self {
        Self {
            registry: self.registry.clone(),
            config: Arc::new(config),
        }
    }

    /// Returns a mapper restricted to the properties of `view`.
    #[inline]
    pub fn with_view(&self, view: &'static str) -> Self {
        self.with_config((*self.config).clone().with_view(view))
    }

    /// Creates a decode context to share identities across calls.
    #[inline]
    pub fn decode_context(&self) -> DecodeContext<'_> {
        DecodeContext::new(&self.registry, &self.config)
    }

    /// Creates an encode context to share identities across calls.
    #[inline]
    pub fn encode_context(&self) -> EncodeContext<'_> {
        EncodeContext::new(&self.registry, &self.config)
    }

    // -------------------------------------------------------------------------
    // Decode

    /// Decodes a `T` with the reader on its first token.
    #[inline]
    pub fn decode<T: Bean>(&self, reader: &mut dyn TokenReader) -> Result<T, Error> {
        self.decode_with(&mut self.decode_context(), reader)
    }

    pub fn decode_with<T: Bean>(
        &self,
        ctx: &mut DecodeContext<'_>,
        reader: &mut dyn TokenReader,
    ) -> Result<T, Error> {
        let bean = ctx.decode_bean::<T>(reader)?;
        reader.advance()?;
        Ok(bean)
    }

    /// Decodes a bean of the registered type `type_id`.
    pub fn decode_dyn(&self, type_id: TypeId, reader: &mut dyn TokenReader) -> Result<BeanBox, Error> {
        let Some(meta) = self.registry.get(type_id) else {
            return Err(ErrorKind::Unregistered {
                type_name: "<dynamic type>",
            }
            .into());
        };
        let mut ctx = self.decode_context();
        let decoded = BeanDecoder::new(meta).decode(reader, &mut ctx)?;
        reader.advance()?;
        Ok(decoded.bean)
    }

    /// Populates an existing bean.
    ///
    /// The reader may be on the `StartObject` or already on the first field.
    #[inline]
    pub fn decode_into<T: Bean>(&self, reader: &mut dyn TokenReader, bean: &mut T) -> Result<(), Error> {
        self.decode_into_with(&mut self.decode_context(), reader, bean)
    }

    pub fn decode_into_with<T: Bean>(
        &self,
        ctx: &mut DecodeContext<'_>,
        reader: &mut dyn TokenReader,
        bean: &mut T,
    ) -> Result<(), Error> {
        let meta = self.registry.require::<T>()?;
        BeanDecoder::new(meta).decode_into(bean as &mut dyn Any, reader, ctx)?;
        reader.advance()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Encode

    #[inline]
    pub fn encode<T: Bean>(&self, bean: &T, writer: &mut dyn TokenWriter) -> Result<(), Error> {
        self.encode_with(&mut self.encode_context(), bean, writer)
    }

    pub fn encode_with<T: Bean>(
        &self,
        ctx: &mut EncodeContext<'_>,
        bean: &T,
        writer: &mut dyn TokenWriter,
    ) -> Result<(), Error> {
        let meta = self.registry.require::<T>()?;
        BeanEncoder::new(meta).encode(bean, writer, ctx)
    }

    // -------------------------------------------------------------------------
    // JSON text

    /// Decodes a `T` from JSON text.
    pub fn from_json<T: Bean>(&self, text: &str) -> Result<T, Error> {
        let buffer = json::from_str(text)?;
        self.decode(&mut buffer.reader())
    }

    /// Encodes `bean` as JSON text.
    pub fn to_json<T: Bean>(&self, bean: &T) -> Result<String, Error> {
        let mut buffer = TokenBuffer::new();
        self.encode(bean, &mut buffer)?;
        Ok(json::to_string(&buffer)?)
    }
}

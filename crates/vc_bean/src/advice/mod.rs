//! Hooks that observe or take over the mapping of one bean type.
//!
//! Advice is bound to a bean type once, either in its description
//! ([`BeanMetaBuilder::deserializer_advice`]) or later on the registry
//! ([`BeanRegistry::bind_deserializer_advice`]), and is then shared by every
//! decode and encode call. The bean in flight is passed to each hook, so an
//! advice keeps no per-call state of its own.
//!
//! [`BeanMetaBuilder::deserializer_advice`]: crate::registry::BeanMetaBuilder::deserializer_advice
//! [`BeanRegistry::bind_deserializer_advice`]: crate::registry::BeanRegistry::bind_deserializer_advice

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use vc_token::{TokenReader, TokenWriter};

use crate::de::DecodeContext;
use crate::error::Error;
use crate::registry::property::{bean_mut, bean_ref};
use crate::registry::{Bean, PropertyDescriptor};
use crate::ser::EncodeContext;

// -----------------------------------------------------------------------------
// DeserializerAdvice

/// Decode hooks of a bean type.
///
/// For every decoded object the hooks run in this order:
///
/// 1. `before`, once, before the first field is consumed.
/// 2. `intercept`, once per field, before the field is looked up.
/// 3. `after`, once, when the closing token of the object is reached.
///
/// Beans with a creator are only available once constructed, so their hooks
/// run while the fields buffered before construction are replayed.
///
/// # Examples
///
/// ```
/// use vc_bean::{DecodeContext, DeserializerAdvice, Error};
/// use vc_token::TokenReader;
///
/// #[derive(Default)]
/// struct Account {
///     secret: Option<String>,
/// }
///
/// struct CaptureSecret;
///
/// impl DeserializerAdvice<Account> for CaptureSecret {
///     fn intercept(
///         &self,
///         bean: &mut Account,
///         property: &str,
///         reader: &mut dyn TokenReader,
///         _ctx: &mut DecodeContext<'_>,
///     ) -> Result<bool, Error> {
///         if property != "secret" {
///             return Ok(false);
///         }
///         bean.secret = reader.text().map(String::from);
///         Ok(true)
///     }
/// }
/// ```
pub trait DeserializerAdvice<T>: Send + Sync + 'static {
    /// Runs before the first field of `bean` is consumed.
    #[inline]
    fn before(
        &self,
        _bean: &mut T,
        _reader: &dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Runs for every field, with the reader on the first token of its value.
    ///
    /// Returning `true` claims the field: the decoder does nothing else with
    /// it. The advice must then leave the reader on the last token of the
    /// value (call [`TokenReader::skip_children`] for objects and arrays it
    /// does not read), otherwise the decode fails with
    /// [`ErrorKind::AdviceDesync`](crate::ErrorKind::AdviceDesync).
    #[inline]
    fn intercept(
        &self,
        _bean: &mut T,
        _property: &str,
        _reader: &mut dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    /// Runs once the closing token of the object is reached.
    #[inline]
    fn after(
        &self,
        _bean: &mut T,
        _reader: &dyn TokenReader,
        _ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// SerializerAdvice

/// Encode hooks of a bean type.
///
/// For every encoded object: `intercept`; unless it returned `true`,
/// `before`, then for each written property `intercept_property` and, unless
/// that returned `true`, `before_property`, the property itself and
/// `after_property`; then `after`.
///
/// The braces of the object are written by the encoder in every case. Hooks
/// may add fields of their own through the writer.
pub trait SerializerAdvice<T>: Send + Sync + 'static {
    /// Returning `true` means the advice wrote (or suppressed) the body.
    #[inline]
    fn intercept(
        &self,
        _bean: &T,
        _writer: &mut dyn TokenWriter,
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    #[inline]
    fn before(
        &self,
        _bean: &T,
        _writer: &mut dyn TokenWriter,
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Returning `true` means the advice wrote (or suppressed) `property`.
    #[inline]
    fn intercept_property(
        &self,
        _bean: &T,
        _property: &PropertyDescriptor,
        _writer: &mut dyn TokenWriter,
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    #[inline]
    fn before_property(
        &self,
        _bean: &T,
        _property: &PropertyDescriptor,
        _writer: &mut dyn TokenWriter,
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }

    #[inline]
    fn after_property(
        &self,
        _bean: &T,
        _property: &PropertyDescriptor,
        _writer: &mut dyn TokenWriter,
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }

    #[inline]
    fn after(
        &self,
        _bean: &T,
        _writer: &mut dyn TokenWriter,
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Erased advice

pub(crate) trait ErasedDeserializerAdvice: Send + Sync {
    fn before(
        &self,
        bean: &mut dyn Any,
        reader: &dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error>;

    fn intercept(
        &self,
        bean: &mut dyn Any,
        property: &str,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error>;

    fn after(
        &self,
        bean: &mut dyn Any,
        reader: &dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error>;
}

pub(crate) trait ErasedSerializerAdvice: Send + Sync {
    fn intercept(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<bool, Error>;

    fn before(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error>;

    fn intercept_property(
        &self,
        bean: &dyn Any,
        property: &PropertyDescriptor,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<bool, Error>;

    fn before_property(
        &self,
        bean: &dyn Any,
        property: &PropertyDescriptor,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error>;

    fn after_property(
        &self,
        bean: &dyn Any,
        property: &PropertyDescriptor,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error>;

    fn after(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error>;
}

struct Bound<T, A> {
    advice: A,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Bean, A: DeserializerAdvice<T>> ErasedDeserializerAdvice for Bound<T, A> {
    #[inline]
    fn before(
        &self,
        bean: &mut dyn Any,
        reader: &dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        self.advice.before(bean_mut::<T>(bean)?, reader, ctx)
    }

    #[inline]
    fn intercept(
        &self,
        bean: &mut dyn Any,
        property: &str,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<bool, Error> {
        self.advice
            .intercept(bean_mut::<T>(bean)?, property, reader, ctx)
    }

    #[inline]
    fn after(
        &self,
        bean: &mut dyn Any,
        reader: &dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        self.advice.after(bean_mut::<T>(bean)?, reader, ctx)
    }
}

impl<T: Bean, A: SerializerAdvice<T>> ErasedSerializerAdvice for Bound<T, A> {
    #[inline]
    fn intercept(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<bool, Error> {
        self.advice.intercept(bean_ref::<T>(bean)?, writer, ctx)
    }

    #[inline]
    fn before(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        self.advice.before(bean_ref::<T>(bean)?, writer, ctx)
    }

    #[inline]
    fn intercept_property(
        &self,
        bean: &dyn Any,
        property: &PropertyDescriptor,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<bool, Error> {
        self.advice
            .intercept_property(bean_ref::<T>(bean)?, property, writer, ctx)
    }

    #[inline]
    fn before_property(
        &self,
        bean: &dyn Any,
        property: &PropertyDescriptor,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        self.advice
            .before_property(bean_ref::<T>(bean)?, property, writer, ctx)
    }

    #[inline]
    fn after_property(
        &self,
        bean: &dyn Any,
        property: &PropertyDescriptor,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        self.advice
            .after_property(bean_ref::<T>(bean)?, property, writer, ctx)
    }

    #[inline]
    fn after(
        &self,
        bean: &dyn Any,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        self.advice.after(bean_ref::<T>(bean)?, writer, ctx)
    }
}

// -----------------------------------------------------------------------------
// AdviceBinding

/// The advice attached to one bean type.
#[derive(Default)]
pub struct AdviceBinding {
    pub(crate) deserializer: Option<Box<dyn ErasedDeserializerAdvice>>,
    pub(crate) serializer: Option<Box<dyn ErasedSerializerAdvice>>,
}

impl AdviceBinding {
    pub(crate) fn set_deserializer<T: Bean, A: DeserializerAdvice<T>>(&mut self, advice: A) {
        self.deserializer = Some(Box::new(Bound {
            advice,
            _marker: PhantomData,
        }));
    }

    pub(crate) fn set_serializer<T: Bean, A: SerializerAdvice<T>>(&mut self, advice: A) {
        self.serializer = Some(Box::new(Bound {
            advice,
            _marker: PhantomData,
        }));
    }

    #[inline]
    pub fn has_deserializer(&self) -> bool {
        self.deserializer.is_some()
    }

    #[inline]
    pub fn has_serializer(&self) -> bool {
        self.serializer.is_some()
    }
}

impl fmt::Debug for AdviceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceBinding")
            .field("deserializer", &self.has_deserializer())
            .field("serializer", &self.has_serializer())
            .finish()
    }
}

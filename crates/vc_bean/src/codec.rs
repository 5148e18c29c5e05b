use vc_token::{TokenReader, TokenWriter};

use crate::de::DecodeContext;
use crate::error::Error;
use crate::registry::BeanRegistry;
use crate::ser::EncodeContext;

// -----------------------------------------------------------------------------
// Codec

/// Conversion of a property value from and to tokens.
///
/// Implemented for scalars, strings, the std containers, [`serde_json::Value`]
/// and `Arc<B>` for beans. A [`Bean`](crate::Bean) becomes usable as a value
/// through [`bean_codec!`](crate::bean_codec).
///
/// # Position
///
/// `decode` starts with the reader on the value's first token and leaves it
/// on the value's last token.
pub trait Codec: Sized + Send + Sync + 'static {
    fn decode(reader: &mut dyn TokenReader, ctx: &mut DecodeContext<'_>) -> Result<Self, Error>;

    fn encode(&self, writer: &mut dyn TokenWriter, ctx: &mut EncodeContext<'_>) -> Result<(), Error>;

    /// Registers the beans this value type refers to.
    #[inline]
    fn register_types(_registry: &mut BeanRegistry) {}
}

/// Implements [`Codec`] for bean types by delegating to the bean mapper.
///
/// # Examples
///
/// ```
/// use vc_bean::{Bean, BeanMeta, bean_codec};
///
/// #[derive(Default)]
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
/// bean_codec!(Point);
/// ```
#[macro_export]
macro_rules! bean_codec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Codec for $ty {
                #[inline]
                fn decode(
                    reader: &mut dyn $crate::__macro_exports::TokenReader,
                    ctx: &mut $crate::DecodeContext<'_>,
                ) -> ::core::result::Result<Self, $crate::Error> {
                    ctx.decode_bean::<Self>(reader)
                }

                #[inline]
                fn encode(
                    &self,
                    writer: &mut dyn $crate::__macro_exports::TokenWriter,
                    ctx: &mut $crate::EncodeContext<'_>,
                ) -> ::core::result::Result<(), $crate::Error> {
                    ctx.encode_bean(self, writer)
                }

                #[inline]
                fn register_types(registry: &mut $crate::BeanRegistry) {
                    registry.register::<Self>();
                }
            }
        )+
    };
}

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;

use vc_token::{TokenReader, TokenWriter};

use crate::codec::Codec;
use crate::de::DecodeContext;
use crate::error::{Error, ErrorKind};
use crate::registry::BeanRegistry;
use crate::ser::EncodeContext;

type DecodeFn<V> =
    Box<dyn Fn(&mut dyn TokenReader, &mut DecodeContext<'_>) -> Result<V, Error> + Send + Sync>;
type EncodeFn<V> = Box<
    dyn Fn(&V, &mut dyn TokenWriter, &mut EncodeContext<'_>) -> Option<Result<(), Error>>
        + Send
        + Sync,
>;
type MatchFn<V> = Box<dyn Fn(&V) -> bool + Send + Sync>;

struct Subtype<V> {
    name: &'static str,
    decode: DecodeFn<V>,
    encode: EncodeFn<V>,
    matches: MatchFn<V>,
    register: fn(&mut BeanRegistry),
}

// -----------------------------------------------------------------------------
// Subtypes

/// The concrete types an externally typed property can hold, by type id.
///
/// # Examples
///
/// ```
/// use vc_bean::Subtypes;
///
/// enum Payload {
///     Text(String),
///     Count(u32),
/// }
///
/// let subtypes = Subtypes::<Payload>::new()
///     .with("text", Payload::Text, |p| match p {
///         Payload::Text(s) => Some(s),
///         _ => None,
///     })
///     .with("count", Payload::Count, |p| match p {
///         Payload::Count(n) => Some(n),
///         _ => None,
///     });
///
/// assert_eq!(subtypes.type_id_of(&Payload::Count(3)), Some("count"));
/// ```
pub struct Subtypes<V> {
    variants: Vec<Subtype<V>>,
    base_type: &'static str,
}

impl<V: 'static> Subtypes<V> {
    #[inline]
    pub fn new() -> Self {
        Self {
            variants: Vec::new(),
            base_type: core::any::type_name::<V>(),
        }
    }

    /// Adds the subtype `S`, stored into `V` by `wrap` and recovered by `unwrap`.
    pub fn with<S: Codec>(
        mut self,
        name: &'static str,
        wrap: fn(S) -> V,
        unwrap: fn(&V) -> Option<&S>,
    ) -> Self {
        self.variants.push(Subtype {
            name,
            decode: Box::new(move |reader, ctx| S::decode(reader, ctx).map(wrap)),
            encode: Box::new(move |value, writer, ctx| {
                unwrap(value).map(|inner| inner.encode(writer, ctx))
            }),
            matches: Box::new(move |value| unwrap(value).is_some()),
            register: S::register_types,
        });
        self
    }

    /// Type id of the subtype `value` holds.
    pub fn type_id_of(&self, value: &V) -> Option<&'static str> {
        self.variants
            .iter()
            .find(|variant| (variant.matches)(value))
            .map(|variant| variant.name)
    }

    pub(crate) fn decode(
        &self,
        type_id: &str,
        reader: &mut dyn TokenReader,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<V, Error> {
        let Some(variant) = self.variants.iter().find(|v| v.name == type_id) else {
            return Err(ErrorKind::UnresolvableType {
                base_type: self.base_type,
                type_id: Some(type_id.to_string()),
            }
            .into());
        };
        (variant.decode)(reader, ctx)
    }

    pub(crate) fn encode(
        &self,
        value: &V,
        writer: &mut dyn TokenWriter,
        ctx: &mut EncodeContext<'_>,
    ) -> Result<(), Error> {
        for variant in &self.variants {
            if let Some(result) = (variant.encode)(value, writer, ctx) {
                return result;
            }
        }
        Err(ErrorKind::UnresolvableType {
            base_type: self.base_type,
            type_id: None,
        }
        .into())
    }

    /// Registration hooks of the subtypes.
    pub(crate) fn dependencies(&self) -> impl Iterator<Item = fn(&mut BeanRegistry)> + '_ {
        self.variants.iter().map(|variant| variant.register)
    }
}

impl<V: 'static> Default for Subtypes<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Subtypes<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.variants.iter().map(|v| v.name))
            .finish()
    }
}

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use serde_json::{Number, Value};
use vc_token::{Token, TokenKind, TokenReader, TokenWriter, json};

use crate::codec::Codec;
use crate::de::DecodeContext;
use crate::error::Error;
use crate::registry::{Bean, BeanRegistry};
use crate::ser::EncodeContext;

#[inline]
fn mismatch(expected: &'static str, reader: &dyn TokenReader) -> Error {
    Error::invalid_value(expected, json::describe_current(reader))
}

// -----------------------------------------------------------------------------
// Scalars

impl Codec for bool {
    fn decode(reader: &mut dyn TokenReader, _ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        reader.boolean().ok_or_else(|| mismatch("bool", reader))
    }

    fn encode(&self, writer: &mut dyn TokenWriter, _ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        Ok(writer.write_bool(*self)?)
    }
}

macro_rules! impl_signed {
    ($($ty:ident)*) => {$(
        impl Codec for $ty {
            fn decode(reader: &mut dyn TokenReader, _ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
                reader
                    .number()
                    .and_then(Number::as_i64)
                    .and_then(|n| $ty::try_from(n).ok())
                    .ok_or_else(|| mismatch(stringify!($ty), reader))
            }

            fn encode(&self, writer: &mut dyn TokenWriter, _ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
                Ok(writer.write_number(Number::from(*self))?)
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ident)*) => {$(
        impl Codec for $ty {
            fn decode(reader: &mut dyn TokenReader, _ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
                reader
                    .number()
                    .and_then(Number::as_u64)
                    .and_then(|n| $ty::try_from(n).ok())
                    .ok_or_else(|| mismatch(stringify!($ty), reader))
            }

            fn encode(&self, writer: &mut dyn TokenWriter, _ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
                Ok(writer.write_number(Number::from(*self))?)
            }
        }
    )*};
}

impl_signed!(i8 i16 i32 i64 isize);
impl_unsigned!(u8 u16 u32 u64 usize);

macro_rules! impl_float {
    ($($ty:ident)*) => {$(
        impl Codec for $ty {
            fn decode(reader: &mut dyn TokenReader, _ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
                reader
                    .number()
                    .and_then(Number::as_f64)
                    .map(|n| n as $ty)
                    .ok_or_else(|| mismatch(stringify!($ty), reader))
            }

            fn encode(&self, writer: &mut dyn TokenWriter, _ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
                let number = Number::from_f64(f64::from(*self))
                    .ok_or_else(|| Error::invalid_value("a finite number", self.to_string()))?;
                Ok(writer.write_number(number)?)
            }
        }
    )*};
}

impl_float!(f32 f64);

impl Codec for String {
    fn decode(reader: &mut dyn TokenReader, _ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        match reader.current() {
            Some(Token::String(text)) => Ok(text.clone()),
            _ => Err(mismatch("String", reader)),
        }
    }

    fn encode(&self, writer: &mut dyn TokenWriter, _ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        Ok(writer.write_string(self)?)
    }
}

impl Codec for char {
    fn decode(reader: &mut dyn TokenReader, _ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        if let Some(Token::String(text)) = reader.current() {
            let mut chars = text.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                return Ok(ch);
            }
        }
        Err(mismatch("char", reader))
    }

    fn encode(&self, writer: &mut dyn TokenWriter, _ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        let mut buf = [0_u8; 4];
        Ok(writer.write_string(self.encode_utf8(&mut buf))?)
    }
}

impl Codec for Value {
    fn decode(reader: &mut dyn TokenReader, _ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        Ok(json::read_value(reader)?)
    }

    fn encode(&self, writer: &mut dyn TokenWriter, _ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        Ok(json::write_value(writer, self)?)
    }
}

// -----------------------------------------------------------------------------
// Containers

impl<T: Codec> Codec for Option<T> {
    fn decode(reader: &mut dyn TokenReader, ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        match reader.kind() {
            Some(TokenKind::Null) => Ok(None),
            _ => T::decode(reader, ctx).map(Some),
        }
    }

    fn encode(&self, writer: &mut dyn TokenWriter, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        match self {
            Some(value) => value.encode(writer, ctx),
            None => Ok(writer.write_null()?),
        }
    }

    #[inline]
    fn register_types(registry: &mut BeanRegistry) {
        T::register_types(registry);
    }
}

impl<T: Codec> Codec for Box<T> {
    #[inline]
    fn decode(reader: &mut dyn TokenReader, ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        T::decode(reader, ctx).map(Box::new)
    }

    #[inline]
    fn encode(&self, writer: &mut dyn TokenWriter, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        (**self).encode(writer, ctx)
    }

    #[inline]
    fn register_types(registry: &mut BeanRegistry) {
        T::register_types(registry);
    }
}

impl<T: Codec> Codec for Vec<T> {
    fn decode(reader: &mut dyn TokenReader, ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        reader.expect(TokenKind::StartArray, "START_ARRAY")?;
        let mut items = Vec::new();
        while reader.next_kind("an array element or END_ARRAY")? != TokenKind::EndArray {
            items.push(T::decode(reader, ctx)?);
        }
        Ok(items)
    }

    fn encode(&self, writer: &mut dyn TokenWriter, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        writer.write_start_array()?;
        for item in self {
            item.encode(writer, ctx)?;
        }
        Ok(writer.write_end_array()?)
    }

    #[inline]
    fn register_types(registry: &mut BeanRegistry) {
        T::register_types(registry);
    }
}

impl<T: Codec> Codec for BTreeMap<String, T> {
    fn decode(reader: &mut dyn TokenReader, ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        reader.expect(TokenKind::StartObject, "START_OBJECT")?;
        let mut map = BTreeMap::new();
        while reader.next_kind("a field name or END_OBJECT")? != TokenKind::EndObject {
            let key = reader
                .field_name()
                .map(String::from)
                .ok_or_else(|| mismatch("a field name", reader))?;
            reader.next_kind("a field value")?;
            map.insert(key, T::decode(reader, ctx)?);
        }
        Ok(map)
    }

    fn encode(&self, writer: &mut dyn TokenWriter, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        writer.write_start_object()?;
        for (key, value) in self {
            writer.write_field_name(key)?;
            value.encode(writer, ctx)?;
        }
        Ok(writer.write_end_object()?)
    }

    #[inline]
    fn register_types(registry: &mut BeanRegistry) {
        T::register_types(registry);
    }
}

// -----------------------------------------------------------------------------
// Shared beans

/// Shared beans take part in object identity: an object reached twice is
/// written in full once and as a reference afterwards, and references decode
/// back to the same `Arc`.
impl<T: Bean> Codec for Arc<T> {
    #[inline]
    fn decode(reader: &mut dyn TokenReader, ctx: &mut DecodeContext<'_>) -> Result<Self, Error> {
        ctx.decode_shared::<T>(reader)
    }

    #[inline]
    fn encode(&self, writer: &mut dyn TokenWriter, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        ctx.encode_bean(&**self, writer)
    }

    #[inline]
    fn register_types(registry: &mut BeanRegistry) {
        registry.register::<T>();
    }
}

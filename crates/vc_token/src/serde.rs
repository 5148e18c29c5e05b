//! Conversion between [`TokenBuffer`] and serde data formats.
//!
//! A buffer holding exactly one value serializes as that value. Deserializing
//! captures the incoming value as tokens, so any self-describing format can
//! feed a [`TokenReader`](crate::TokenReader).

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_core::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_core::ser::{self, SerializeMap, SerializeSeq};
use serde_core::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

use crate::buffer::TokenBuffer;
use crate::token::Token;

// -----------------------------------------------------------------------------
// Helpers

/// Number of tokens forming the value that starts at `tokens[0]`.
fn value_len(tokens: &[Token]) -> Option<usize> {
    let first = tokens.first()?.kind();
    if first.is_scalar() {
        return Some(1);
    }
    if !first.is_structure_start() {
        return None;
    }
    let mut depth = 0_usize;
    for (index, token) in tokens.iter().enumerate() {
        let kind = token.kind();
        if kind.is_structure_start() {
            depth += 1;
        } else if kind.is_structure_end() {
            depth -= 1;
            if depth == 0 {
                return Some(index + 1);
            }
        }
    }
    None
}

// -----------------------------------------------------------------------------
// Serialize

/// Exactly the tokens of one value.
struct ValueTokens<'a>(&'a [Token]);

impl Serialize for ValueTokens<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use ser::Error;

        let tokens = self.0;
        let Some(first) = tokens.first() else {
            return Err(S::Error::custom("missing value"));
        };
        match first {
            Token::String(value) => serializer.serialize_str(value),
            Token::Number(value) => value.serialize(serializer),
            Token::Bool(value) => serializer.serialize_bool(*value),
            Token::Null => serializer.serialize_unit(),
            Token::Embedded(_) => Err(S::Error::custom(
                "embedded values have no serialized form",
            )),
            Token::StartObject => {
                let end = tokens.len() - 1;
                let mut map = serializer.serialize_map(None)?;
                let mut index = 1;
                while index < end {
                    let Token::FieldName(name) = &tokens[index] else {
                        return Err(S::Error::custom(format_args!(
                            "expected FIELD_NAME, found {}",
                            tokens[index].kind()
                        )));
                    };
                    let value = &tokens[index + 1..end];
                    let len = value_len(value)
                        .ok_or_else(|| S::Error::custom("truncated member value"))?;
                    map.serialize_entry(name.as_str(), &ValueTokens(&value[..len]))?;
                    index += 1 + len;
                }
                map.end()
            }
            Token::StartArray => {
                let end = tokens.len() - 1;
                let mut seq = serializer.serialize_seq(None)?;
                let mut index = 1;
                while index < end {
                    let value = &tokens[index..end];
                    let len = value_len(value)
                        .ok_or_else(|| S::Error::custom("truncated array element"))?;
                    seq.serialize_element(&ValueTokens(&value[..len]))?;
                    index += len;
                }
                seq.end()
            }
            other => Err(S::Error::custom(format_args!(
                "a value cannot start with {}",
                other.kind()
            ))),
        }
    }
}

impl Serialize for TokenBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use ser::Error;

        let tokens = self.tokens();
        match value_len(tokens) {
            Some(len) if len == tokens.len() => ValueTokens(tokens).serialize(serializer),
            _ => Err(S::Error::custom(
                "token buffer does not hold exactly one complete value",
            )),
        }
    }
}

// -----------------------------------------------------------------------------
// Deserialize

/// Appends the tokens of one incoming value.
struct Capture<'a>(&'a mut Vec<Token>);

impl<'de> DeserializeSeed<'de> for Capture<'_> {
    type Value = ();

    #[inline]
    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for Capture<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON-like value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<(), E> {
        self.0.push(Token::Bool(v));
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<(), E> {
        self.0.push(Token::Number(Number::from(v)));
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<(), E> {
        self.0.push(Token::Number(Number::from(v)));
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<(), E> {
        let number = Number::from_f64(v).ok_or_else(|| E::custom("non-finite number"))?;
        self.0.push(Token::Number(number));
        Ok(())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<(), E> {
        self.0.push(Token::string(v));
        Ok(())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<(), E> {
        self.0.push(Token::String(v));
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        self.0.push(Token::Null);
        Ok(())
    }

    fn visit_none<E: de::Error>(self) -> Result<(), E> {
        self.0.push(Token::Null);
        Ok(())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let tokens = self.0;
        tokens.push(Token::StartArray);
        while seq.next_element_seed(Capture(&mut *tokens))?.is_some() {}
        tokens.push(Token::EndArray);
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let tokens = self.0;
        tokens.push(Token::StartObject);
        while let Some(key) = map.next_key::<String>()? {
            tokens.push(Token::FieldName(key));
            map.next_value_seed(Capture(&mut *tokens))?;
        }
        tokens.push(Token::EndObject);
        Ok(())
    }
}

impl<'de> Deserialize<'de> for TokenBuffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut tokens = Vec::new();
        Capture(&mut tokens).deserialize(deserializer)?;
        Ok(TokenBuffer::from_tokens(tokens))
    }
}

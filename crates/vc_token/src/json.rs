//! JSON text and [`serde_json::Value`] bridges.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde_core::Deserialize;
use serde_json::{Map, Value};

use crate::buffer::TokenBuffer;
use crate::error::TokenError;
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};
use crate::writer::TokenWriter;

// -----------------------------------------------------------------------------
// Text

/// Tokenizes one JSON document.
///
/// # Examples
///
/// ```
/// let buffer = vc_token::json::from_str(r#"{"a":1}"#).unwrap();
/// assert_eq!(buffer.len(), 4);
/// ```
pub fn from_str(text: &str) -> Result<TokenBuffer, TokenError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let buffer = TokenBuffer::deserialize(&mut deserializer)
        .map_err(|e| TokenError::Syntax(e.to_string()))?;
    deserializer
        .end()
        .map_err(|e| TokenError::Syntax(e.to_string()))?;
    Ok(buffer)
}

/// Renders a buffer holding one value as compact JSON text.
pub fn to_string(buffer: &TokenBuffer) -> Result<String, TokenError> {
    serde_json::to_string(buffer).map_err(|e| TokenError::Syntax(e.to_string()))
}

// -----------------------------------------------------------------------------
// Value

/// Reads the value starting at the current token into a [`Value`].
///
/// Leaves the reader on the value's last token.
pub fn read_value(reader: &mut dyn TokenReader) -> Result<Value, TokenError> {
    let Some(token) = reader.current() else {
        return Err(TokenError::UnexpectedEnd { expected: "a value" });
    };
    Ok(match token {
        Token::String(text) => Value::String(text.clone()),
        Token::Number(number) => Value::Number(number.clone()),
        Token::Bool(value) => Value::Bool(*value),
        Token::Null => Value::Null,
        Token::Embedded(_) => return Err(TokenError::Unsupported("embedded value as JSON")),
        Token::StartArray => {
            let mut items = Vec::new();
            while reader.next_kind("an array element or END_ARRAY")? != TokenKind::EndArray {
                items.push(read_value(reader)?);
            }
            Value::Array(items)
        }
        Token::StartObject => {
            let mut map = Map::new();
            loop {
                match reader.next_kind("a field name or END_OBJECT")? {
                    TokenKind::EndObject => break,
                    TokenKind::FieldName => {
                        let name = reader.field_name().unwrap_or_default().to_string();
                        reader.next_kind("a field value")?;
                        map.insert(name, read_value(reader)?);
                    }
                    found => {
                        return Err(TokenError::UnexpectedToken {
                            expected: "a field name or END_OBJECT",
                            found,
                        });
                    }
                }
            }
            Value::Object(map)
        }
        other => {
            return Err(TokenError::UnexpectedToken {
                expected: "a value",
                found: other.kind(),
            });
        }
    })
}

/// Writes a [`Value`] as tokens.
pub fn write_value(writer: &mut dyn TokenWriter, value: &Value) -> Result<(), TokenError> {
    match value {
        Value::Null => writer.write_null(),
        Value::Bool(value) => writer.write_bool(*value),
        Value::Number(number) => writer.write_number(number.clone()),
        Value::String(text) => writer.write_string(text),
        Value::Array(items) => {
            writer.write_start_array()?;
            for item in items {
                write_value(writer, item)?;
            }
            writer.write_end_array()
        }
        Value::Object(map) => {
            writer.write_start_object()?;
            for (name, item) in map {
                writer.write_field_name(name)?;
                write_value(writer, item)?;
            }
            writer.write_end_object()
        }
    }
}

/// Tokenizes a [`Value`].
pub fn from_value(value: &Value) -> Result<TokenBuffer, TokenError> {
    let mut buffer = TokenBuffer::new();
    write_value(&mut buffer, value)?;
    Ok(buffer)
}

/// Renders the value under the reader for diagnostics, without failing.
pub fn describe_current(reader: &dyn TokenReader) -> String {
    match reader.current() {
        Some(Token::String(text)) => format!("{text:?}"),
        Some(Token::Number(number)) => number.to_string(),
        Some(Token::Bool(value)) => value.to_string(),
        Some(Token::FieldName(name)) => format!("field {name:?}"),
        Some(other) => other.kind().name().to_string(),
        None => "end-of-input".to_string(),
    }
}

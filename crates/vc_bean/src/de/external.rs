use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use vc_token::{DocumentPath, TokenBuffer, TokenReader, TokenWriter, json};

use crate::de::DecodeContext;
use crate::error::{Error, ErrorKind};
use crate::registry::{BeanMeta, PropertyKind};
use crate::registry::property::Accessor;

struct Slot {
    property: usize,
    name: &'static str,
    type_property: &'static str,
    type_id: Option<String>,
    value: Option<(TokenBuffer, DocumentPath)>,
}

/// Pairs externally typed values with their type ids, which may arrive in
/// either order.
pub(crate) struct ExternalTypeHandler {
    slots: Vec<Slot>,
}

impl ExternalTypeHandler {
    pub fn new(meta: &BeanMeta) -> Self {
        let slots = meta
            .external_properties()
            .filter_map(|property| match property.kind() {
                PropertyKind::External { type_property } => Some(Slot {
                    property: property.index(),
                    name: property.name(),
                    type_property: *type_property,
                    type_id: None,
                    value: None,
                }),
                _ => None,
            })
            .collect();
        Self { slots }
    }

    /// Records the type id under the reader if `name` is a type property.
    ///
    /// Returns `true` if some external property uses `name` as its type id.
    pub fn handle_type_id(&mut self, name: &str, reader: &dyn TokenReader) -> Result<bool, Error> {
        let mut matched = false;
        for slot in self.slots.iter_mut().filter(|slot| slot.type_property == name) {
            let Some(type_id) = reader.text() else {
                return Err(Error::invalid_value(
                    "a type id string",
                    json::describe_current(reader),
                ));
            };
            slot.type_id = Some(String::from(type_id));
            matched = true;
        }
        Ok(matched)
    }

    /// Captures the value under the reader if `name` is an external property.
    pub fn capture_value(&mut self, name: &str, reader: &mut dyn TokenReader) -> Result<bool, Error> {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.name == name) else {
            return Ok(false);
        };
        let location = reader.path();
        let mut buffer = TokenBuffer::new();
        buffer.copy_current_structure(reader)?;
        slot.value = Some((buffer, location));
        Ok(true)
    }

    /// Decodes every captured value with its resolved subtype.
    pub fn complete(
        self,
        meta: &BeanMeta,
        bean: &mut dyn Any,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<(), Error> {
        for slot in self.slots {
            let property = &meta.properties()[slot.property];
            match (slot.type_id, slot.value) {
                (Some(type_id), Some((buffer, location))) => {
                    let Accessor::External(access) = &property.accessor else {
                        continue;
                    };
                    let mut replay = buffer.reader_at(location.clone());
                    access
                        .decode(bean, &type_id, &mut replay, ctx)
                        .map_err(|e| e.at_property(meta.name(), slot.name, Some(location)))?;
                }
                (None, Some(_)) => {
                    return Err(Error::new(ErrorKind::MissingTypeId {
                        property: slot.name,
                        type_property: slot.type_property,
                    })
                    .at_property(meta.name(), slot.name, None));
                }
                // A type id without a value leaves the property untouched.
                (_, None) => {}
            }
        }
        Ok(())
    }
}

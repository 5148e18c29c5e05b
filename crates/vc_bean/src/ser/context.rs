use core::any::{Any, TypeId};

use vc_token::TokenWriter;

use crate::config::MapperConfig;
use crate::error::{Error, ErrorKind};
use crate::hash::HashMap;
use crate::identity::IdKey;
use crate::registry::{Bean, BeanRegistry};
use crate::ser::BeanEncoder;

// -----------------------------------------------------------------------------
// EncodeContext

/// State of one encode call.
///
/// Holds the registry and configuration in use, the identities assigned to
/// objects written so far and the nesting depth.
pub struct EncodeContext<'a> {
    registry: &'a BeanRegistry,
    config: &'a MapperConfig,
    identities: HashMap<(TypeId, usize), IdKey>,
    next_id: i64,
    depth: usize,
}

impl<'a> EncodeContext<'a> {
    #[inline]
    pub fn new(registry: &'a BeanRegistry, config: &'a MapperConfig) -> Self {
        Self {
            registry,
            config,
            identities: HashMap::default(),
            next_id: 1,
            depth: 0,
        }
    }

    #[inline]
    pub fn registry(&self) -> &'a BeanRegistry {
        self.registry
    }

    #[inline]
    pub fn config(&self) -> &'a MapperConfig {
        self.config
    }

    /// Encodes a registered bean.
    pub fn encode_bean<T: Bean>(&mut self, bean: &T, writer: &mut dyn TokenWriter) -> Result<(), Error> {
        let meta = self.registry.require::<T>()?;
        BeanEncoder::new(meta).encode(bean, writer, self)
    }

    /// The identity assigned to `bean` earlier in this context.
    #[inline]
    pub(crate) fn object_id(&self, type_id: TypeId, bean: &dyn Any) -> Option<&IdKey> {
        self.identities.get(&(type_id, address(bean)))
    }

    pub(crate) fn remember(&mut self, type_id: TypeId, bean: &dyn Any, key: IdKey) {
        log::trace!("object at {:#x} written with id {key}", address(bean));
        self.identities.insert((type_id, address(bean)), key);
    }

    #[inline]
    pub(crate) fn generate_id(&mut self) -> IdKey {
        let id = self.next_id;
        self.next_id += 1;
        IdKey::Int(id)
    }

    pub(crate) fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.config.max_depth() {
            return Err(ErrorKind::RecursionExhausted {
                limit: self.config.max_depth(),
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[inline]
fn address(bean: &dyn Any) -> usize {
    bean as *const dyn Any as *const () as usize
}

use alloc::string::ToString;
use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use vc_token::TokenReader;

use crate::config::MapperConfig;
use crate::de::BeanDecoder;
use crate::error::{Error, ErrorKind};
use crate::hash::HashMap;
use crate::identity::IdKey;
use crate::registry::{Bean, BeanBox, BeanMeta, BeanRegistry};

type Shared = Arc<dyn Any + Send + Sync>;

// -----------------------------------------------------------------------------
// DecodeContext

/// State of one decode call.
///
/// Holds the registry and configuration in use, the identity table of the
/// call and the nesting depth. A context may be reused across calls to share
/// object identities between them.
pub struct DecodeContext<'a> {
    registry: &'a BeanRegistry,
    config: &'a MapperConfig,
    identities: HashMap<(TypeId, IdKey), Shared>,
    depth: usize,
}

impl<'a> DecodeContext<'a> {
    #[inline]
    pub fn new(registry: &'a BeanRegistry, config: &'a MapperConfig) -> Self {
        Self {
            registry,
            config,
            identities: HashMap::default(),
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

    /// Decodes a bean of type `T` with the reader on its first token.
    pub fn decode_bean<T: Bean>(&mut self, reader: &mut dyn TokenReader) -> Result<T, Error> {
        let meta = self.registry.require::<T>()?;
        BeanDecoder::new(meta).decode(reader, self)?.into_bean(meta)
    }

    /// Decodes a shared bean, taking part in object identity.
    ///
    /// A scalar in place of the object is a reference to a bean decoded
    /// earlier in this context. A decoded bean carrying an identity is
    /// recorded for later references.
    pub fn decode_shared<T: Bean>(&mut self, reader: &mut dyn TokenReader) -> Result<Arc<T>, Error> {
        let meta = self.registry.require::<T>()?;
        let is_reference = reader.kind().is_some_and(|kind| kind.is_scalar())
            && (meta.identity().is_some() || !meta.has_scalar_creator());
        if is_reference {
            let key = IdKey::read(reader)?;
            return self.resolve::<T>(key);
        }

        let decoded = BeanDecoder::new(meta).decode(reader, self)?;
        let identity = decoded.identity.clone();
        let bean = Arc::new(decoded.into_bean::<T>(meta)?);
        if let Some(key) = identity {
            log::trace!("`{}` registered under id {key}", meta.name());
            self.identities
                .insert((TypeId::of::<T>(), key), bean.clone() as Shared);
        }
        Ok(bean)
    }

    fn resolve<T: Bean>(&self, key: IdKey) -> Result<Arc<T>, Error> {
        let Some(shared) = self.identities.get(&(TypeId::of::<T>(), key.clone())) else {
            return Err(ErrorKind::UnresolvedReference {
                id: key.to_string(),
            }
            .into());
        };
        shared.clone().downcast::<T>().map_err(|_| {
            Error::custom(format_args!(
                "object {key} is not a `{}`",
                type_name::<T>()
            ))
        })
    }

    /// Number of identities recorded so far.
    #[inline]
    pub fn identity_count(&self) -> usize {
        self.identities.len()
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

// -----------------------------------------------------------------------------
// Decoded

/// A decoded bean and the identity read for it, if any.
pub struct Decoded {
    pub bean: BeanBox,
    pub identity: Option<IdKey>,
}

impl Decoded {
    /// Unboxes the bean as `T`, the type described by `meta`.
    pub fn into_bean<T: Bean>(self, meta: &BeanMeta) -> Result<T, Error> {
        match self.bean.downcast::<T>() {
            Ok(bean) => Ok(*bean),
            Err(_) => Err(Error::custom(format_args!(
                "decoded `{}` is not a `{}`",
                meta.name(),
                type_name::<T>()
            ))),
        }
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoded")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

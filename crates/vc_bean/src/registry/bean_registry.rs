use core::any::{TypeId, type_name};

use crate::advice::{DeserializerAdvice, SerializerAdvice};
use crate::error::{Error, ErrorKind};
use crate::hash::{HashMap, NoOpHashState, TypeIdMap};
use crate::registry::{Bean, BeanMeta};

// -----------------------------------------------------------------------------
// BeanRegistry

/// The descriptions of all known bean types.
///
/// Built mutably through [`register`](Self::register), then shared read-only,
/// usually inside an `Arc` held by a [`BeanMapper`](crate::BeanMapper).
///
/// # Examples
///
/// ```
/// use vc_bean::{Bean, BeanMeta, BeanRegistry};
///
/// #[derive(Default)]
/// struct Tag {
///     label: String,
/// }
///
/// impl Bean for Tag {
///     fn describe() -> BeanMeta {
///         BeanMeta::builder::<Self>("Tag")
///             .with_default()
///             .field("label", |t| &t.label, |t, v| t.label = v)
///             .build()
///     }
/// }
///
/// let mut registry = BeanRegistry::new();
/// registry.register::<Tag>();
///
/// assert!(registry.contains::<Tag>());
/// assert_eq!(registry.get_by_name("Tag").unwrap().properties().len(), 1);
/// ```
#[derive(Debug)]
pub struct BeanRegistry {
    metas: TypeIdMap<BeanMeta>,
    names: HashMap<&'static str, TypeId>,
}

impl BeanRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            metas: TypeIdMap::with_hasher(NoOpHashState),
            names: HashMap::default(),
        }
    }

    /// Registers `T` and every bean its description refers to.
    ///
    /// Registering a type twice has no effect.
    pub fn register<T: Bean>(&mut self) -> &mut Self {
        if !self.metas.contains_key(&TypeId::of::<T>()) {
            self.insert(T::describe());
        }
        self
    }

    /// Registers a description, replacing any previous one for its type.
    ///
    /// Types the description refers to are registered as well.
    pub fn insert(&mut self, mut meta: BeanMeta) -> &mut Self {
        let dependencies = core::mem::take(&mut meta.dependencies);
        let type_id = meta.type_id();
        log::debug!(
            "registering bean `{}` with {} properties",
            meta.name(),
            meta.properties().len()
        );
        if let Some(previous) = self.names.insert(meta.name(), type_id)
            && previous != type_id
        {
            log::warn!("bean name `{}` is used by two types", meta.name());
        }
        // Inserted first so that cyclic descriptions terminate.
        self.metas.insert(type_id, meta);
        for register in dependencies {
            register(self);
        }
        self
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&BeanMeta> {
        self.metas.get(&type_id)
    }

    #[inline]
    pub fn get_by_name(&self, name: &str) -> Option<&BeanMeta> {
        self.names.get(name).and_then(|type_id| self.metas.get(type_id))
    }

    /// Returns the description of `T`, or [`ErrorKind::Unregistered`].
    #[inline]
    pub fn require<T: Bean>(&self) -> Result<&BeanMeta, Error> {
        self.get(TypeId::of::<T>()).ok_or_else(|| {
            ErrorKind::Unregistered {
                type_name: type_name::<T>(),
            }
            .into()
        })
    }

    #[inline]
    pub fn contains<T: Bean>(&self) -> bool {
        self.metas.contains_key(&TypeId::of::<T>())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BeanMeta> {
        self.metas.values()
    }

    // -------------------------------------------------------------------------
    // Advice

    /// Binds decode advice to `T`, registering `T` if needed.
    ///
    /// Replaces advice bound earlier, including advice from the description.
    pub fn bind_deserializer_advice<T, A>(&mut self, advice: A) -> &mut Self
    where
        T: Bean,
        A: DeserializerAdvice<T>,
    {
        self.register::<T>();
        if let Some(meta) = self.metas.get_mut(&TypeId::of::<T>()) {
            log::debug!("binding decode advice `{}` to `{}`", type_name::<A>(), meta.name());
            meta.advice.set_deserializer::<T, A>(advice);
        }
        self
    }

    /// Binds encode advice to `T`, registering `T` if needed.
    pub fn bind_serializer_advice<T, A>(&mut self, advice: A) -> &mut Self
    where
        T: Bean,
        A: SerializerAdvice<T>,
    {
        self.register::<T>();
        if let Some(meta) = self.metas.get_mut(&TypeId::of::<T>()) {
            log::debug!("binding encode advice `{}` to `{}`", type_name::<A>(), meta.name());
            meta.advice.set_serializer::<T, A>(advice);
        }
        self
    }
}

impl Default for BeanRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

use alloc::borrow::Cow;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::hash::{HashMap, HashSet};
use crate::registry::{BeanMeta, PropertyDescriptor};

// -----------------------------------------------------------------------------
// PropertyFilter

/// Decides per property whether it is written at all.
///
/// Looked up through the filter id of a bean, see
/// [`BeanMetaBuilder::filter_id`](crate::registry::BeanMetaBuilder::filter_id).
pub trait PropertyFilter: Send + Sync + 'static {
    fn include(&self, bean: &BeanMeta, property: &PropertyDescriptor) -> bool;
}

/// A [`PropertyFilter`] matching property names against a fixed set.
#[derive(Debug, Clone)]
pub struct SimplePropertyFilter {
    names: HashSet<Cow<'static, str>>,
    include: bool,
}

impl SimplePropertyFilter {
    /// Writes only the named properties.
    pub fn include_only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            include: true,
        }
    }

    /// Writes every property except the named ones.
    pub fn exclude<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            include: false,
        }
    }
}

impl PropertyFilter for SimplePropertyFilter {
    #[inline]
    fn include(&self, _bean: &BeanMeta, property: &PropertyDescriptor) -> bool {
        self.names.contains(property.name()) == self.include
    }
}

// -----------------------------------------------------------------------------
// UnknownPropertyPolicy

/// What the decoder does with a field that nothing else claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownPropertyPolicy {
    /// Fail with [`ErrorKind::UnknownProperty`](crate::ErrorKind::UnknownProperty).
    #[default]
    Fail,
    /// Skip the value.
    Ignore,
}

// -----------------------------------------------------------------------------
// MapperConfig

/// Per-mapper settings.
///
/// Immutable once handed to a mapper. The `with_*` methods derive a new
/// configuration with one setting overridden.
///
/// # Examples
///
/// ```
/// use vc_bean::{MapperConfig, UnknownPropertyPolicy};
///
/// let base = MapperConfig::default();
/// let lenient = base.clone().with_unknown_properties(UnknownPropertyPolicy::Ignore);
///
/// assert_eq!(base.unknown_properties(), UnknownPropertyPolicy::Fail);
/// assert_eq!(lenient.unknown_properties(), UnknownPropertyPolicy::Ignore);
/// ```
#[derive(Clone)]
pub struct MapperConfig {
    active_view: Option<Cow<'static, str>>,
    unknown_properties: UnknownPropertyPolicy,
    max_depth: usize,
    filters: HashMap<Cow<'static, str>, Arc<dyn PropertyFilter>>,
}

impl MapperConfig {
    /// Nesting limit used by [`MapperConfig::default`].
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    #[inline]
    pub fn active_view(&self) -> Option<&str> {
        self.active_view.as_deref()
    }

    #[inline]
    pub fn unknown_properties(&self) -> UnknownPropertyPolicy {
        self.unknown_properties
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn filter(&self, id: &str) -> Option<&Arc<dyn PropertyFilter>> {
        self.filters.get(id)
    }

    /// Restricts decode and encode to the properties of one view.
    #[inline]
    pub fn with_view(mut self, view: impl Into<Cow<'static, str>>) -> Self {
        self.active_view = Some(view.into());
        self
    }

    #[inline]
    pub fn without_view(mut self) -> Self {
        self.active_view = None;
        self
    }

    #[inline]
    pub fn with_unknown_properties(mut self, policy: UnknownPropertyPolicy) -> Self {
        self.unknown_properties = policy;
        self
    }

    /// Limits how many beans may be nested inside each other.
    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Registers a filter under `id`, replacing any previous one.
    pub fn with_filter(
        mut self,
        id: impl Into<Cow<'static, str>>,
        filter: impl PropertyFilter,
    ) -> Self {
        self.filters.insert(id.into(), Arc::new(filter));
        self
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            active_view: None,
            unknown_properties: UnknownPropertyPolicy::Fail,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            filters: HashMap::default(),
        }
    }
}

impl fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters: Vec<&str> = self.filters.keys().map(|id| id.as_ref()).collect();
        filters.sort_unstable();
        f.debug_struct("MapperConfig")
            .field("active_view", &self.active_view)
            .field("unknown_properties", &self.unknown_properties)
            .field("max_depth", &self.max_depth)
            .field("filters", &filters)
            .finish()
    }
}

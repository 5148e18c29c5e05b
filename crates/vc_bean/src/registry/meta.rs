use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use core::fmt;
use core::marker::PhantomData;

use serde_json::{Map, Value};
use vc_token::Token;

use crate::advice::{AdviceBinding, DeserializerAdvice, SerializerAdvice};
use crate::codec::Codec;
use crate::error::{Error, ErrorKind};
use crate::hash::{HashMap, HashSet, NoOpHashState, TypeIdMap};
use crate::identity::{IdSource, IdentityPolicy};
use crate::naming::NameTransformer;
use crate::registry::creator::{BeanBox, ConstructionPlan, CreatorArgs};
use crate::registry::property::{
    Accessor, ExternalField, FieldAccess, PropertyDescriptor, PropertyKind, UnwrappedField,
    bean_mut, bean_ref, register_bean, register_codec,
};
use crate::registry::{BeanRegistry, Subtypes};

type Ctor = Box<dyn Fn() -> BeanBox + Send + Sync>;
type ScalarCtor = Box<dyn Fn(&Token) -> Result<BeanBox, Error> + Send + Sync>;
type Upcast = Box<dyn Fn(BeanBox) -> Result<BeanBox, Error> + Send + Sync>;
type Factory = Box<dyn Fn(&mut CreatorArgs) -> Result<BeanBox, Error> + Send + Sync>;

// -----------------------------------------------------------------------------
// Bean

/// A type mapped property by property.
///
/// `describe` is called once, when the type is registered in a
/// [`BeanRegistry`]. Beans referenced by the description (field values,
/// unwrapped children, subtypes) are registered along with it.
pub trait Bean: Any + Send + Sync + Sized {
    fn describe() -> BeanMeta;
}

// -----------------------------------------------------------------------------
// Catch-all property

pub(crate) trait AnyAccess: Send + Sync {
    fn get<'a>(&self, bean: &'a dyn Any) -> Result<Option<&'a Map<String, Value>>, Error>;

    fn set(&self, bean: &mut dyn Any, name: String, value: Value) -> Result<(), Error>;

    fn has_setter(&self) -> bool;
}

struct AnyField<T> {
    get: Option<fn(&T) -> &Map<String, Value>>,
    set: Option<fn(&mut T, String, Value)>,
}

impl<T: Bean> AnyAccess for AnyField<T> {
    fn get<'a>(&self, bean: &'a dyn Any) -> Result<Option<&'a Map<String, Value>>, Error> {
        match self.get {
            Some(get) => Ok(Some(get(bean_ref::<T>(bean)?))),
            None => Ok(None),
        }
    }

    fn set(&self, bean: &mut dyn Any, name: String, value: Value) -> Result<(), Error> {
        if let Some(set) = self.set {
            set(bean_mut::<T>(bean)?, name, value);
        }
        Ok(())
    }

    #[inline]
    fn has_setter(&self) -> bool {
        self.set.is_some()
    }
}

// -----------------------------------------------------------------------------
// DecodePolicy

/// Structural features of a bean, selecting the decode path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodePolicy {
    /// The bean is built by a creator from buffered parameters.
    pub needs_buffering: bool,
    /// Some property is restricted to views.
    pub has_views: bool,
    /// Some property is typed by an external type id.
    pub has_external: bool,
    /// Some property is an unwrapped child.
    pub has_unwrapped: bool,
    /// The bean carries an object identity.
    pub has_identity: bool,
}

/// Document form of a bean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Shape {
    /// `{"name": value, ...}`
    #[default]
    Object,
    /// `[value, ...]` in declaration order.
    Array,
}

// -----------------------------------------------------------------------------
// BeanMeta

/// The description of a bean type: its properties and how to build it.
///
/// Created through [`BeanMeta::builder`], immutable once registered (apart
/// from advice binding before the registry is shared).
pub struct BeanMeta {
    type_id: TypeId,
    type_path: &'static str,
    name: &'static str,
    properties: Vec<PropertyDescriptor>,
    lookup: HashMap<&'static str, usize>,
    ignorable: HashSet<&'static str>,
    type_properties: HashSet<&'static str>,
    external: Vec<usize>,
    unwrapped: Vec<usize>,
    any: Option<Box<dyn AnyAccess>>,
    creator: Option<ConstructionPlan>,
    default_ctor: Option<Ctor>,
    scalar_ctor: Option<ScalarCtor>,
    upcasts: TypeIdMap<Upcast>,
    identity: Option<IdentityPolicy>,
    filter_id: Option<&'static str>,
    shape: Shape,
    ignore_unknown: bool,
    policy: DecodePolicy,
    pub(crate) advice: AdviceBinding,
    pub(crate) dependencies: Vec<fn(&mut BeanRegistry)>,
}

impl BeanMeta {
    /// Starts the description of `T`, named `name` in error messages.
    #[inline]
    pub fn builder<T: Bean>(name: &'static str) -> BeanMetaBuilder<T> {
        BeanMetaBuilder::new(name)
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type path, e.g. `my_crate::User`.
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// The short name used in messages, e.g. `User`.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All properties in declaration order.
    #[inline]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Finds a property that owns the field `name` in the document.
    ///
    /// Unwrapped and externally typed properties own no field of their own
    /// name and are not found here.
    #[inline]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.lookup.get(name).map(|&index| &self.properties[index])
    }

    #[inline]
    pub fn is_ignorable(&self, name: &str) -> bool {
        self.ignorable.contains(name)
    }

    /// Returns `true` if `name` carries the type id of an external property.
    #[inline]
    pub fn is_type_property(&self, name: &str) -> bool {
        self.type_properties.contains(name)
    }

    #[inline]
    pub fn creator(&self) -> Option<&ConstructionPlan> {
        self.creator.as_ref()
    }

    #[inline]
    pub fn identity(&self) -> Option<&IdentityPolicy> {
        self.identity.as_ref()
    }

    #[inline]
    pub fn filter_id(&self) -> Option<&'static str> {
        self.filter_id
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns `true` if unknown fields are skipped regardless of configuration.
    #[inline]
    pub fn ignores_unknown(&self) -> bool {
        self.ignore_unknown
    }

    #[inline]
    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    #[inline]
    pub fn advice(&self) -> &AdviceBinding {
        &self.advice
    }

    #[inline]
    pub fn has_catch_all(&self) -> bool {
        self.any.is_some()
    }

    #[inline]
    pub(crate) fn any(&self) -> Option<&dyn AnyAccess> {
        self.any.as_deref()
    }

    #[inline]
    pub(crate) fn external_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.external.iter().map(|&index| &self.properties[index])
    }

    #[inline]
    pub(crate) fn unwrapped_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.unwrapped.iter().map(|&index| &self.properties[index])
    }

    /// Creates an empty bean with the default constructor.
    pub(crate) fn instantiate(&self) -> Result<BeanBox, Error> {
        match &self.default_ctor {
            Some(ctor) => Ok(ctor()),
            None => Err(ErrorKind::Construction {
                bean_type: self.name,
                message: "no default constructor and no creator".into(),
            }
            .into()),
        }
    }

    #[inline]
    pub(crate) fn has_scalar_creator(&self) -> bool {
        self.scalar_ctor.is_some()
    }

    /// Creates a bean from a single scalar token.
    pub(crate) fn from_scalar(&self, token: &Token) -> Option<Result<BeanBox, Error>> {
        self.scalar_ctor.as_ref().map(|ctor| ctor(token))
    }

    /// Converts a bean of a registered subtype into this type.
    pub(crate) fn upcast(&self, bean: BeanBox) -> Result<BeanBox, Error> {
        let concrete = (*bean).type_id();
        if concrete == self.type_id {
            return Ok(bean);
        }
        match self.upcasts.get(&concrete) {
            Some(upcast) => upcast(bean),
            None => Err(ErrorKind::UnresolvableType {
                base_type: self.name,
                type_id: None,
            }
            .into()),
        }
    }
}

impl fmt::Debug for BeanMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanMeta")
            .field("name", &self.name)
            .field("type_path", &self.type_path)
            .field("properties", &self.properties)
            .field("ignorable", &self.ignorable)
            .field("creator", &self.creator)
            .field("identity", &self.identity)
            .field("shape", &self.shape)
            .field("policy", &self.policy)
            .field("advice", &self.advice)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// BeanMetaBuilder

/// Builder of a [`BeanMeta`].
///
/// Properties are declared in document order. Modifiers such as
/// [`views`](Self::views) apply to the property declared last.
///
/// # Examples
///
/// ```
/// use vc_bean::{Bean, BeanMeta};
///
/// #[derive(Default)]
/// struct User {
///     first_name: String,
///     last_name: String,
///     password: Option<String>,
/// }
///
/// impl Bean for User {
///     fn describe() -> BeanMeta {
///         BeanMeta::builder::<Self>("User")
///             .with_default()
///             .field("firstName", |u| &u.first_name, |u, v| u.first_name = v)
///             .field("lastName", |u| &u.last_name, |u, v| u.last_name = v)
///             .ignore("password")
///             .build()
///     }
/// }
///
/// let meta = User::describe();
/// assert_eq!(meta.properties().len(), 2);
/// assert!(meta.is_ignorable("password"));
/// ```
pub struct BeanMetaBuilder<T> {
    name: &'static str,
    properties: Vec<PropertyDescriptor>,
    ignorable: HashSet<&'static str>,
    any: Option<AnyField<T>>,
    factory: Option<Factory>,
    default_ctor: Option<Ctor>,
    scalar_ctor: Option<ScalarCtor>,
    upcasts: TypeIdMap<Upcast>,
    identity: Option<IdentityPolicy>,
    filter_id: Option<&'static str>,
    shape: Shape,
    ignore_unknown: bool,
    advice: AdviceBinding,
    dependencies: Vec<fn(&mut BeanRegistry)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Bean> BeanMetaBuilder<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            properties: Vec::new(),
            ignorable: HashSet::default(),
            any: None,
            factory: None,
            default_ctor: None,
            scalar_ctor: None,
            upcasts: TypeIdMap::with_hasher(NoOpHashState),
            identity: None,
            filter_id: None,
            shape: Shape::Object,
            ignore_unknown: false,
            advice: AdviceBinding::default(),
            dependencies: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn push(mut self, property: PropertyDescriptor) -> Self {
        if self.properties.iter().any(|p| p.name() == property.name()) {
            log::warn!(
                "`{}` declares property \"{}\" twice, keeping the first",
                self.name,
                property.name()
            );
            return self;
        }
        self.properties.push(property);
        self
    }

    // -------------------------------------------------------------------------
    // Construction

    /// Builds empty beans with `T::default()`.
    #[inline]
    pub fn with_default(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Builds empty beans with `ctor`, to be populated field by field.
    pub fn constructor(mut self, ctor: fn() -> T) -> Self {
        self.default_ctor = Some(Box::new(move || Box::new(ctor()) as BeanBox));
        self
    }

    /// Builds beans from the creator properties.
    ///
    /// Fields arriving before all creator properties are known are buffered.
    pub fn creator<F>(mut self, factory: F) -> Self
    where
        F: Fn(&mut CreatorArgs) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(move |args: &mut CreatorArgs| {
            factory(args).map(|bean| Box::new(bean) as BeanBox)
        }));
        self
    }

    /// Like [`creator`](Self::creator), but the creator may return a bean of
    /// a subtype registered with [`subtype`](Self::subtype). The remaining
    /// fields are then decoded by the subtype's description.
    pub fn dynamic_creator<F>(mut self, factory: F) -> Self
    where
        F: Fn(&mut CreatorArgs) -> Result<BeanBox, Error> + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Builds beans from a lone scalar, e.g. `"red"` instead of `{...}`.
    pub fn from_scalar(mut self, ctor: fn(&Token) -> Result<T, Error>) -> Self {
        self.scalar_ctor = Some(Box::new(move |token: &Token| {
            ctor(token).map(|bean| Box::new(bean) as BeanBox)
        }));
        self
    }

    /// Declares `S` as a subtype, converted into `T` by `upcast`.
    pub fn subtype<S: Bean>(mut self, upcast: fn(S) -> T) -> Self {
        self.upcasts.insert(
            TypeId::of::<S>(),
            Box::new(move |bean: BeanBox| match bean.downcast::<S>() {
                Ok(sub) => Ok(Box::new(upcast(*sub)) as BeanBox),
                Err(_) => Err(Error::custom(format_args!(
                    "expected a bean of type `{}`",
                    type_name::<S>()
                ))),
            }),
        );
        self.dependencies.push(register_bean::<S>);
        self
    }

    // -------------------------------------------------------------------------
    // Properties

    /// Declares a property read by `get` and written by `set`.
    pub fn field<V: Codec>(self, name: &'static str, get: fn(&T) -> &V, set: fn(&mut T, V)) -> Self {
        self.value_property::<V>(name, PropertyKind::Field, get, Some(set))
    }

    /// Declares a property that is written but never read back.
    pub fn read_only<V: Codec>(self, name: &'static str, get: fn(&T) -> &V) -> Self {
        self.value_property::<V>(name, PropertyKind::Field, get, None)
    }

    /// Declares parameter `index` of the creator.
    pub fn creator_property<V: Codec>(
        self,
        name: &'static str,
        index: usize,
        get: fn(&T) -> &V,
    ) -> Self {
        self.value_property::<V>(name, PropertyKind::Creator { index }, get, None)
    }

    fn value_property<V: Codec>(
        mut self,
        name: &'static str,
        kind: PropertyKind,
        get: fn(&T) -> &V,
        set: Option<fn(&mut T, V)>,
    ) -> Self {
        self.dependencies.push(register_codec::<V>);
        let accessor = Accessor::Value(Box::new(FieldAccess { get, set }));
        self.push(PropertyDescriptor::new(name, kind, accessor))
    }

    /// Declares a child bean whose fields appear directly in this object.
    #[inline]
    pub fn unwrapped<C: Bean>(self, name: &'static str, get: fn(&T) -> &C, set: fn(&mut T, C)) -> Self {
        self.unwrapped_with(name, NameTransformer::none(), get, set)
    }

    /// Like [`unwrapped`](Self::unwrapped), renaming the child's fields.
    pub fn unwrapped_with<C: Bean>(
        mut self,
        name: &'static str,
        transformer: NameTransformer,
        get: fn(&T) -> &C,
        set: fn(&mut T, C),
    ) -> Self {
        self.dependencies.push(register_bean::<C>);
        let accessor = Accessor::Unwrapped(Box::new(UnwrappedField { get, set }));
        self.push(PropertyDescriptor::new(
            name,
            PropertyKind::Unwrapped { transformer },
            accessor,
        ))
    }

    /// Declares a polymorphic property whose subtype is named by the sibling
    /// field `type_property`.
    pub fn external<V: Send + Sync + 'static>(
        mut self,
        name: &'static str,
        type_property: &'static str,
        subtypes: Subtypes<V>,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
    ) -> Self {
        self.dependencies.extend(subtypes.dependencies());
        let accessor = Accessor::External(Box::new(ExternalField { get, set, subtypes }));
        self.push(PropertyDescriptor::new(
            name,
            PropertyKind::External { type_property },
            accessor,
        ))
    }

    /// Restricts the property declared last to the given views.
    pub fn views(mut self, views: &[&'static str]) -> Self {
        match self.properties.last_mut() {
            Some(property) => property.set_views(views.into()),
            None => log::warn!("`{}`: `views` called before any property", self.name),
        }
        self
    }

    /// Marks a field name to be skipped silently when decoding.
    pub fn ignore(mut self, name: &'static str) -> Self {
        self.ignorable.insert(name);
        self
    }

    /// Skips every unknown field of this bean.
    pub fn ignore_unknown(mut self) -> Self {
        self.ignore_unknown = true;
        self
    }

    /// Receives every field nothing else claims, decoded as a JSON value.
    pub fn any_setter(mut self, set: fn(&mut T, String, Value)) -> Self {
        self.any.get_or_insert(AnyField { get: None, set: None }).set = Some(set);
        self
    }

    /// Writes the entries of a map as extra fields after the declared ones.
    pub fn any_getter(mut self, get: fn(&T) -> &Map<String, Value>) -> Self {
        self.any.get_or_insert(AnyField { get: None, set: None }).get = Some(get);
        self
    }

    // -------------------------------------------------------------------------
    // Identity, filters and shape

    /// Identifies objects by generated integers, written in the field `name`.
    pub fn generated_id(mut self, name: &'static str) -> Self {
        self.identity = Some(IdentityPolicy {
            source: IdSource::Generated(name),
            always_as_id: false,
        });
        self
    }

    /// Identifies objects by the value of the scalar property `name`.
    pub fn property_id(mut self, name: &'static str) -> Self {
        self.identity = Some(IdentityPolicy {
            source: IdSource::Property(name),
            always_as_id: false,
        });
        self
    }

    /// Writes every occurrence as a bare id. Requires an identity.
    pub fn always_as_id(mut self) -> Self {
        match &mut self.identity {
            Some(identity) => identity.always_as_id = true,
            None => log::warn!("`{}`: `always_as_id` without an identity", self.name),
        }
        self
    }

    /// Names the [`PropertyFilter`](crate::PropertyFilter) applied when encoding.
    pub fn filter_id(mut self, id: &'static str) -> Self {
        self.filter_id = Some(id);
        self
    }

    /// Maps the bean to an array of its property values.
    pub fn array_shape(mut self) -> Self {
        self.shape = Shape::Array;
        self
    }

    // -------------------------------------------------------------------------
    // Advice

    /// Binds decode advice.
    pub fn deserializer_advice<A: DeserializerAdvice<T>>(mut self, advice: A) -> Self {
        self.advice.set_deserializer::<T, A>(advice);
        self
    }

    /// Binds encode advice.
    pub fn serializer_advice<A: SerializerAdvice<T>>(mut self, advice: A) -> Self {
        self.advice.set_serializer::<T, A>(advice);
        self
    }

    // -------------------------------------------------------------------------
    // Build

    pub fn build(self) -> BeanMeta {
        let mut properties = self.properties;
        let mut lookup = HashMap::default();
        let mut type_properties = HashSet::default();
        let mut external = Vec::new();
        let mut unwrapped = Vec::new();
        let mut creator_params: Vec<(usize, usize, &'static str)> = Vec::new();
        let mut has_views = false;

        for (index, property) in properties.iter_mut().enumerate() {
            property.set_index(index);
            has_views |= property.views().is_some();
            match property.kind() {
                PropertyKind::Field => {
                    lookup.insert(property.name(), index);
                }
                PropertyKind::Creator { index: param } => {
                    lookup.insert(property.name(), index);
                    creator_params.push((*param, index, property.name()));
                }
                PropertyKind::Unwrapped { .. } => unwrapped.push(index),
                PropertyKind::External { type_property } => {
                    type_properties.insert(*type_property);
                    external.push(index);
                }
            }
        }

        let creator = self.factory.map(|factory| {
            creator_params.sort_unstable_by_key(|&(param, ..)| param);
            let len = creator_params.last().map_or(0, |&(param, ..)| param + 1);
            let mut params = Vec::with_capacity(len);
            let mut names = Vec::with_capacity(len);
            for param in 0..len {
                match creator_params.iter().find(|&&(p, ..)| p == param) {
                    Some(&(_, index, name)) => {
                        params.push(index);
                        names.push(name);
                    }
                    None => {
                        log::warn!("`{}`: creator parameter {param} has no property", self.name);
                        params.push(usize::MAX);
                        names.push("?");
                    }
                }
            }
            ConstructionPlan::new(params.into(), names.into(), factory)
        });

        if creator.is_none() && !creator_params.is_empty() {
            log::warn!("`{}` declares creator properties but no creator", self.name);
        }

        let policy = DecodePolicy {
            needs_buffering: creator.is_some(),
            has_views,
            has_external: !external.is_empty(),
            has_unwrapped: !unwrapped.is_empty(),
            has_identity: self.identity.is_some(),
        };

        BeanMeta {
            type_id: TypeId::of::<T>(),
            type_path: type_name::<T>(),
            name: self.name,
            properties,
            lookup,
            ignorable: self.ignorable,
            type_properties,
            external,
            unwrapped,
            any: self.any.map(|any| Box::new(any) as Box<dyn AnyAccess>),
            creator,
            default_ctor: self.default_ctor,
            scalar_ctor: self.scalar_ctor,
            upcasts: self.upcasts,
            identity: self.identity,
            filter_id: self.filter_id,
            shape: self.shape,
            ignore_unknown: self.ignore_unknown,
            policy,
            advice: self.advice,
            dependencies: self.dependencies,
        }
    }
}

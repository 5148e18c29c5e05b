use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, type_name};
use core::fmt;

use crate::error::{Error, ErrorKind};
use crate::identity::IdKey;

/// An owned, type-erased bean.
pub type BeanBox = Box<dyn Any + Send + Sync>;

type Factory = Box<dyn Fn(&mut CreatorArgs) -> Result<BeanBox, Error> + Send + Sync>;

// -----------------------------------------------------------------------------
// CreatorArgs

/// Decoded creator parameters, handed to the creator of a bean.
///
/// # Examples
///
/// ```
/// use vc_bean::{Bean, BeanMeta};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Bean for Point {
///     fn describe() -> BeanMeta {
///         BeanMeta::builder::<Self>("Point")
///             .creator_property("x", 0, |p| &p.x)
///             .creator_property("y", 1, |p| &p.y)
///             .creator(|args| {
///                 Ok(Point {
///                     x: args.take(0)?,
///                     y: args.take_or_default(1)?,
///                 })
///             })
///             .build()
///     }
/// }
/// ```
pub struct CreatorArgs {
    bean_type: &'static str,
    names: Box<[&'static str]>,
    slots: Vec<Option<Box<dyn Any + Send + Sync>>>,
}

impl CreatorArgs {
    fn new(bean_type: &'static str, names: Box<[&'static str]>) -> Self {
        let mut slots = Vec::with_capacity(names.len());
        slots.resize_with(names.len(), || None);
        Self {
            bean_type,
            names,
            slots,
        }
    }

    /// Number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if parameter `index` was present in the document.
    #[inline]
    pub fn is_present(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Option::is_some)
    }

    /// Takes parameter `index`, which must be present.
    pub fn take<V: Any>(&mut self, index: usize) -> Result<V, Error> {
        match self.take_opt(index)? {
            Some(value) => Ok(value),
            None => Err(self.error(format_args!(
                "missing creator property \"{}\"",
                self.name(index)
            ))),
        }
    }

    /// Takes parameter `index`, or `None` if it was absent.
    pub fn take_opt<V: Any>(&mut self, index: usize) -> Result<Option<V>, Error> {
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(self.error(format_args!("no creator parameter at index {index}")));
        };
        match slot.take() {
            None => Ok(None),
            Some(value) => match value.downcast::<V>() {
                Ok(value) => Ok(Some(*value)),
                Err(_) => Err(self.error(format_args!(
                    "creator property \"{}\" is not a `{}`",
                    self.name(index),
                    type_name::<V>()
                ))),
            },
        }
    }

    /// Takes parameter `index`, or its default value if it was absent.
    #[inline]
    pub fn take_or_default<V: Any + Default>(&mut self, index: usize) -> Result<V, Error> {
        Ok(self.take_opt(index)?.unwrap_or_default())
    }

    #[inline]
    fn name(&self, index: usize) -> &'static str {
        self.names.get(index).copied().unwrap_or("?")
    }

    fn error(&self, message: fmt::Arguments<'_>) -> Error {
        ErrorKind::Construction {
            bean_type: self.bean_type,
            message: alloc::format!("{message}"),
        }
        .into()
    }
}

// -----------------------------------------------------------------------------
// ConstructionPlan

/// How to build a bean from its creator parameters.
pub struct ConstructionPlan {
    params: Box<[usize]>,
    names: Box<[&'static str]>,
    factory: Factory,
}

impl ConstructionPlan {
    pub(crate) fn new(params: Box<[usize]>, names: Box<[&'static str]>, factory: Factory) -> Self {
        Self {
            params,
            names,
            factory,
        }
    }

    /// Number of creator parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Declaration index of the property feeding each parameter.
    #[inline]
    pub fn params(&self) -> &[usize] {
        &self.params
    }

    /// Invokes the creator.
    ///
    /// The returned bean may be of a subtype of the planned bean type.
    pub(crate) fn build(&self, buffer: &mut ValueBuffer) -> Result<BeanBox, Error> {
        (self.factory)(&mut buffer.args)
    }

    pub(crate) fn buffer(&self, bean_type: &'static str) -> ValueBuffer {
        ValueBuffer {
            args: CreatorArgs::new(bean_type, self.names.clone()),
            filled: 0,
            identity: None,
        }
    }
}

impl fmt::Debug for ConstructionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionPlan")
            .field("params", &self.names)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ValueBuffer

/// Staging area of one creator-based decode.
pub(crate) struct ValueBuffer {
    args: CreatorArgs,
    filled: usize,
    pub identity: Option<IdKey>,
}

impl ValueBuffer {
    /// Stores a parameter. Returns `true` once every parameter is present.
    pub fn assign(&mut self, index: usize, value: Box<dyn Any + Send + Sync>) -> bool {
        if let Some(slot) = self.args.slots.get_mut(index) {
            if slot.is_none() {
                self.filled += 1;
            }
            *slot = Some(value);
        }
        self.is_complete()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.filled == self.args.slots.len()
    }
}

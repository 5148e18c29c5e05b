#![doc = include_str!("../README.md")]
#![no_std]

// -----------------------------------------------------------------------------
// Switch macros

/// Expands the given tokens unconditionally.
///
/// Used as the "enabled" side of an alias produced by [`define_alias`].
///
/// - `enabled!()` expands to `true`.
/// - `enabled!(if { A } else { B })` expands to `A`.
/// - `enabled!{ A }` expands to `A`.
#[macro_export]
macro_rules! enabled {
    () => { true };
    (if { $($p:tt)* } else { $($n:tt)* }) => { $($p)* };
    ($($p:tt)*) => { $($p)* };
}

/// Discards the given tokens.
///
/// Used as the "disabled" side of an alias produced by [`define_alias`].
///
/// - `disabled!()` expands to `false`.
/// - `disabled!(if { A } else { B })` expands to `B`.
/// - `disabled!{ A }` expands to nothing.
#[macro_export]
macro_rules! disabled {
    () => { false };
    (if { $($p:tt)* } else { $($n:tt)* }) => { $($n)* };
    ($($p:tt)*) => {};
}

// -----------------------------------------------------------------------------
// Alias definition

/// Defines a set of macros named after `cfg` predicates.
///
/// Each alias resolves to [`enabled`] when the predicate holds and to
/// [`disabled`] otherwise, so a crate can write `crate::cfg::std! { .. }`
/// instead of repeating `#[cfg(feature = "std")]` on every item.
///
/// # Examples
///
/// ```
/// pub mod cfg {
///     vc_cfg::define_alias! {
///         #[cfg(debug_assertions)] => debug,
///         #[cfg(feature = "never")] => never,
///     }
/// }
///
/// assert_eq!(cfg::debug!(), cfg!(debug_assertions));
/// assert!(!cfg::never!());
///
/// let v = cfg::never! {
///     if { 1 } else { 2 }
/// };
/// assert_eq!(v, 2);
/// ```
#[macro_export]
macro_rules! define_alias {
    (
        #[cfg($meta:meta)] => $p:ident
        $(, $($rest:tt)*)?
    ) => {
        $crate::define_alias! { @alias $meta, $p }
        $( $crate::define_alias! { $($rest)* } )?
    };
    () => {};
    (@alias $meta:meta, $p:ident) => {
        #[doc = concat!("Expands the given code only if `", stringify!($meta), "` holds.")]
        #[cfg($meta)]
        pub use $crate::enabled as $p;

        #[doc = concat!("Expands the given code only if `", stringify!($meta), "` holds.")]
        #[cfg(not($meta))]
        pub use $crate::disabled as $p;
    };
}

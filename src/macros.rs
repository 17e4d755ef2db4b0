//! # Record Declaration Macro
//!
//! `flat_struct!` turns an ordered field declaration list into everything a
//! record type needs: the marker type, the layout construction, and a struct
//! of typed field descriptors whose accessors forward to
//! [`Field::get_value`]/[`Field::set_value`] against the record's store.
//!
//! ## Usage
//!
//! ```ignore
//! flat_struct! {
//!     pub struct Token {
//!         pub kind: int(6),
//!         pub seen: bool,
//!         pub line: int,
//!         pub name: str,
//!         pub(crate) items: ref(Item),
//!     }
//! }
//!
//! let (layout, fields) = TokenFields::build()?;
//! let mut tokens = FlatArray::new(&layout);
//! let at = tokens.push();
//! fields.kind.set(at, &mut tokens, 5);
//! ```
//!
//! ## Field kinds
//!
//! | Declaration | Descriptor |
//! |-------------|------------|
//! | `int` | [`IntField`] (whole word) |
//! | `int(bits)` | [`IntPartField`] |
//! | `bool` | [`BoolField`] (one bit) |
//! | `str` | [`StrField`] |
//! | `str(bits)` | [`StrPartField`] |
//! | `ref(Target)` | [`RefField`] |
//! | `ref(Target, bits)` | [`RefPartField`] |
//!
//! Fields are allocated in declaration order under the layout rules (full
//! fields need word alignment, part fields never straddle a word), so
//! `build()` fails exactly where a hand-written builder would. Per-field
//! visibility is ordinary Rust visibility on the descriptor, defaulting to
//! module-private when omitted.
//!
//! [`Field::get_value`]: crate::fields::Field::get_value
//! [`Field::set_value`]: crate::fields::Field::set_value
//! [`IntField`]: crate::fields::IntField
//! [`IntPartField`]: crate::fields::IntPartField
//! [`BoolField`]: crate::fields::BoolField
//! [`StrField`]: crate::fields::StrField
//! [`StrPartField`]: crate::fields::StrPartField
//! [`RefField`]: crate::fields::RefField
//! [`RefPartField`]: crate::fields::RefPartField

/// Declare a record type and its field descriptor set. See the module docs.
#[macro_export]
macro_rules! flat_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $fvis:vis $fname:ident : $kind:tt $( ( $($args:tt)* ) )? ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name;

        impl $crate::FlatStruct for $name {
            const NAME: &'static str = ::core::stringify!($name);
        }

        ::paste::paste! {
            /// Field descriptors for the record type, in declaration order.
            #[derive(Clone, Copy, Debug)]
            $vis struct [<$name Fields>] {
                $( $fvis $fname : $crate::flat_field_type!($name, $kind $( ( $($args)* ) )?), )+
            }

            impl [<$name Fields>] {
                /// Allocate every declared field in order and seal the layout.
                $vis fn build() -> ::eyre::Result<($crate::Layout<$name>, Self)> {
                    let mut builder = $crate::LayoutBuilder::<$name>::new();
                    $( let $fname = $crate::flat_field_build!(builder, $kind $( ( $($args)* ) )?); )+
                    Ok((builder.finish(), Self { $($fname),+ }))
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! flat_field_type {
    ($S:ident, int) => { $crate::IntField<$S> };
    ($S:ident, int($bits:expr)) => { $crate::IntPartField<$S> };
    ($S:ident, bool) => { $crate::BoolField<$S> };
    ($S:ident, str) => { $crate::StrField<$S> };
    ($S:ident, str($bits:expr)) => { $crate::StrPartField<$S> };
    ($S:ident, ref($R:ty)) => { $crate::RefField<$S, $R> };
    ($S:ident, ref($R:ty, $bits:expr)) => { $crate::RefPartField<$S, $R> };
}

#[doc(hidden)]
#[macro_export]
macro_rules! flat_field_build {
    ($builder:ident, int) => { $builder.int()? };
    ($builder:ident, int($bits:expr)) => { $builder.int_bits($bits)? };
    ($builder:ident, bool) => { $builder.bool()? };
    ($builder:ident, str) => { $builder.str()? };
    ($builder:ident, str($bits:expr)) => { $builder.str_bits($bits)? };
    ($builder:ident, ref($R:ty)) => { $builder.ref_to::<$R>()? };
    ($builder:ident, ref($R:ty, $bits:expr)) => { $builder.ref_bits::<$R>($bits)? };
}

//! Tagged cells holding one of a fixed list of unrelated types
//!
//! A cell is declared with [`multi_type_cell!`](crate::multi_type_cell),
//! which expands to an enum with an `Empty` variant plus one variant per
//! member type. Member positions are resolved at compile time:
//!
//! - assigning a value goes through a generated `From` impl, so a type that
//!   is not a member does not compile, and neither does a list naming the
//!   same type twice;
//! - extraction by position goes through [`CellAt`], implemented once per
//!   position.
//!
//! Every member type must be at least as visible as the cell itself: the
//! generated [`CellAt`] impls name them in a public associated type, so a
//! `pub` cell over a private member fails with E0446.
//!
//! ```
//! use strata_core::{CellError, MultiTypeCell, multi_type_cell};
//!
//! multi_type_cell! {
//!     #[derive(Debug, PartialEq)]
//!     pub enum Payload {
//!         Code(u16),
//!         Text(String),
//!     }
//! }
//!
//! let mut cell = Payload::new();
//! cell.assign("pool exhausted".to_string());
//! assert_eq!(cell.active_index(), Some(1));
//!
//! assert_eq!(cell.at::<0>(), Err(CellError::type_mismatch(0, Some(1))));
//! assert_eq!(cell.at::<1>().as_deref(), Ok("pool exhausted"));
//! assert!(cell.is_empty());
//! ```

use crate::error::CellError;

/// Largest value in a list of type sizes
///
/// Used to compute [`MultiTypeCell::MAX_SIZE`]; see
/// [`max_size_of!`](crate::max_size_of) for the type-list form.
pub const fn max_size_of(sizes: &[usize]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < sizes.len() {
        if sizes[i] > max {
            max = sizes[i];
        }
        i += 1;
    }
    max
}

/// Common interface of every generated cell
pub trait MultiTypeCell: Sized {
    /// Number of member types
    const ARITY: usize;

    /// Size in bytes of the largest member type
    const MAX_SIZE: usize;

    /// Position of the held type, `None` when empty
    fn active_index(&self) -> Option<usize>;

    /// Drops the held value, if any, and leaves the cell empty
    fn clear(&mut self);

    /// Returns true when no value is held
    fn is_empty(&self) -> bool {
        self.active_index().is_none()
    }

    /// Returns true when the member at `position` is held
    fn holds(&self, position: usize) -> bool {
        self.active_index() == Some(position)
    }
}

/// Destructive extraction of the member at position `I`
pub trait CellAt<const I: usize>: MultiTypeCell {
    /// Member type stored at position `I`
    type Output;

    /// Moves the value out if position `I` is active
    ///
    /// On success the cell is left empty. On mismatch the cell is left
    /// untouched and [`CellError::TypeMismatch`] is returned.
    fn take_at(&mut self) -> Result<Self::Output, CellError>;
}

/// Size of the largest type in a list
///
/// ```
/// assert_eq!(strata_core::max_size_of!(u8, u64, u16), 8);
/// ```
#[macro_export]
macro_rules! max_size_of {
    ($($ty:ty),+ $(,)?) => {
        $crate::cell::max_size_of(&[$(::core::mem::size_of::<$ty>()),+])
    };
}

/// Declares a multi-type cell
///
/// See the [module documentation](crate::cell) for the generated API.
#[macro_export]
macro_rules! multi_type_cell {
    (@positions $name:ident; $index:expr;) => {};

    (@positions $name:ident; $index:expr; $variant:ident($ty:ty) $(, $rest:ident($rest_ty:ty))*) => {
        impl $crate::cell::CellAt<{ $index }> for $name {
            type Output = $ty;

            fn take_at(&mut self) -> ::core::result::Result<$ty, $crate::CellError> {
                match ::core::mem::replace(self, Self::Empty) {
                    Self::$variant(value) => ::core::result::Result::Ok(value),
                    other => {
                        let active = $crate::cell::MultiTypeCell::active_index(&other);
                        *self = other;
                        ::core::result::Result::Err($crate::CellError::type_mismatch($index, active))
                    }
                }
            }
        }

        $crate::multi_type_cell!(@positions $name; $index + 1usize; $($rest($rest_ty)),*);
    };

    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$variant_meta:meta])* $variant:ident($ty:ty) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            /// No value is held
            Empty,
            $( $(#[$variant_meta])* $variant($ty), )+
        }

        impl $name {
            /// Creates an empty cell
            #[inline]
            pub const fn new() -> Self {
                Self::Empty
            }

            /// Stores a value of one of the member types
            ///
            /// Any previously held value is dropped.
            pub fn assign<U>(&mut self, value: U) -> &mut Self
            where
                Self: ::core::convert::From<U>,
            {
                *self = <Self as ::core::convert::From<U>>::from(value);
                self
            }

            /// Moves the value at position `I` out, leaving the cell empty
            pub fn at<const I: usize>(
                &mut self,
            ) -> ::core::result::Result<<Self as $crate::cell::CellAt<I>>::Output, $crate::CellError>
            where
                Self: $crate::cell::CellAt<I>,
            {
                <Self as $crate::cell::CellAt<I>>::take_at(self)
            }

            /// Position of the held type, `None` when empty
            pub fn active_index(&self) -> ::core::option::Option<usize> {
                $crate::cell::MultiTypeCell::active_index(self)
            }

            /// Returns true when no value is held
            pub fn is_empty(&self) -> bool {
                $crate::cell::MultiTypeCell::is_empty(self)
            }

            /// Drops the held value, if any
            pub fn clear(&mut self) {
                $crate::cell::MultiTypeCell::clear(self);
            }
        }

        impl $crate::cell::MultiTypeCell for $name {
            const ARITY: usize = [$(stringify!($variant)),+].len();
            const MAX_SIZE: usize = $crate::max_size_of!($($ty),+);

            #[allow(unused_assignments)]
            fn active_index(&self) -> ::core::option::Option<usize> {
                let mut position = 0usize;
                $(
                    if let Self::$variant(_) = self {
                        return ::core::option::Option::Some(position);
                    }
                    position += 1;
                )+
                ::core::option::Option::None
            }

            fn clear(&mut self) {
                *self = Self::Empty;
            }
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self::Empty
            }
        }

        $(
            impl ::core::convert::From<$ty> for $name {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+

        $crate::multi_type_cell!(@positions $name; 0usize; $($variant($ty)),+);
    };
}

//! Raw atomic operations on caller-owned cells.
//!
//! Every width reaches a primitive family through [`AtomicInt`]:
//!
//! - `i8`..`i64` are serviced directly;
//! - unsigned widths go through the signed family of the same width;
//! - `usize`, `isize` and pointers go through [`Word`], the `i64` family on
//!   64-bit targets and the `i32` family on 32-bit targets;
//! - booleans are 32-bit cells holding `0` or `1`.
//!
//! Derived operations are layered strictly on top of the primitives and never
//! add a second atomic access: `op_fetch` recomputes `<op>` on the snapshot
//! returned by `fetch_op`, and `inc`/`dec` are `add_fetch`/`sub_fetch` by one.
//!
//! # Safety
//!
//! All functions here take raw cell pointers. The caller guarantees that the
//! pointer is non-null, aligned to the cell's width, valid for reads and writes
//! for the duration of the call, and that concurrent accesses to the cell all
//! go through this module at the same width. [`AtomicCell`](crate::AtomicCell)
//! packages those guarantees for cells the caller is happy to type.

#![allow(clippy::missing_safety_doc)]

use num_traits::One;

use crate::backend::{Add, And, AtomicInt, Or, Primitives, RmwOp, Sub, Xor};
use crate::order::MemoryOrder;

/// The integer family used for word-sized and pointer cells.
#[cfg(target_pointer_width = "64")]
pub type Word = i64;
/// The integer family used for word-sized and pointer cells.
#[cfg(target_pointer_width = "32")]
pub type Word = i32;

/// A value that can live in an atomic cell, carried by an [`AtomicInt`] repr.
pub trait CellValue: Copy {
    /// The primitive width that stores this value.
    type Repr: AtomicInt;

    /// Encodes the value for storage.
    fn into_repr(self) -> Self::Repr;

    /// Decodes a stored value.
    fn from_repr(repr: Self::Repr) -> Self;
}

/// Integer cell types: everything that supports fetch-ops and inc/dec.
///
/// # Safety
///
/// Implementors must have the same size and alignment as `Self::Repr`, so that
/// a `*mut Self` can be accessed as a `*mut Self::Repr`.
pub unsafe trait Integer: CellValue {}

macro_rules! integer {
    ($($int:ty => $repr:ty),* $(,)?) => {
        $(
            impl CellValue for $int {
                type Repr = $repr;

                #[inline(always)]
                #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::unnecessary_cast)]
                fn into_repr(self) -> $repr {
                    self as $repr
                }

                #[inline(always)]
                #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::unnecessary_cast)]
                fn from_repr(repr: $repr) -> Self {
                    repr as $int
                }
            }

            // SAFETY: same-width integers share size and alignment, and
            // `usize`/`isize` match `Word` on the supported pointer widths.
            unsafe impl Integer for $int {}
        )*
    };
}

integer! {
    i8 => i8, u8 => i8,
    i16 => i16, u16 => i16,
    i32 => i32, u32 => i32,
    i64 => i64, u64 => i64,
    isize => Word, usize => Word,
}

impl CellValue for bool {
    type Repr = i32;

    #[inline(always)]
    fn into_repr(self) -> i32 {
        i32::from(self)
    }

    #[inline(always)]
    fn from_repr(repr: i32) -> Self {
        repr != 0
    }
}

impl<U> CellValue for *mut U {
    type Repr = Word;

    #[inline(always)]
    #[allow(clippy::cast_possible_wrap)]
    fn into_repr(self) -> Word {
        self as usize as Word
    }

    #[inline(always)]
    #[allow(clippy::cast_sign_loss)]
    fn from_repr(repr: Word) -> Self {
        repr as usize as *mut U
    }
}

// Repr-level entry points. `AtomicCell` calls these on its own storage.

#[inline(always)]
pub(crate) unsafe fn load_repr<R: AtomicInt>(cell: *mut R, order: MemoryOrder) -> R {
    <R::Backend as Primitives<R>>::load(cell, order)
}

#[inline(always)]
pub(crate) unsafe fn store_repr<R: AtomicInt>(cell: *mut R, value: R, order: MemoryOrder) {
    <R::Backend as Primitives<R>>::store(cell, value, order);
}

#[inline(always)]
pub(crate) unsafe fn swap_repr<R: AtomicInt>(cell: *mut R, value: R, order: MemoryOrder) -> R {
    <R::Backend as Primitives<R>>::swap(cell, value, order)
}

#[inline(always)]
pub(crate) unsafe fn compare_and_swap_repr<R: AtomicInt>(
    cell: *mut R,
    value: R,
    comparand: R,
    order: MemoryOrder,
) -> R {
    <R::Backend as Primitives<R>>::compare_and_swap(cell, value, comparand, order)
}

#[inline(always)]
pub(crate) unsafe fn fetch_op_repr<Op: RmwOp, R: AtomicInt>(
    cell: *mut R,
    value: R,
    order: MemoryOrder,
) -> R {
    <R::Backend as Primitives<R>>::fetch_op::<Op>(cell, value, order)
}

#[inline(always)]
pub(crate) unsafe fn op_fetch_repr<Op: RmwOp, R: AtomicInt>(
    cell: *mut R,
    value: R,
    order: MemoryOrder,
) -> R {
    Op::apply(fetch_op_repr::<Op, R>(cell, value, order), value)
}

/// Atomically reads an integer cell.
#[inline(always)]
pub unsafe fn load<T: Integer>(cell: *mut T, order: MemoryOrder) -> T {
    T::from_repr(load_repr(cell.cast::<T::Repr>(), order))
}

/// Atomically writes an integer cell.
#[inline(always)]
pub unsafe fn store<T: Integer>(cell: *mut T, value: T, order: MemoryOrder) {
    store_repr(cell.cast::<T::Repr>(), value.into_repr(), order);
}

/// Atomically replaces an integer cell, returning the previous value.
#[inline(always)]
pub unsafe fn swap<T: Integer>(cell: *mut T, value: T, order: MemoryOrder) -> T {
    T::from_repr(swap_repr(cell.cast::<T::Repr>(), value.into_repr(), order))
}

/// Writes `value` if the cell holds `comparand`, returning the value observed.
///
/// The write happened iff the returned value equals `comparand`.
#[inline(always)]
pub unsafe fn compare_and_swap<T: Integer>(cell: *mut T, value: T, comparand: T, order: MemoryOrder) -> T {
    T::from_repr(compare_and_swap_repr(
        cell.cast::<T::Repr>(),
        value.into_repr(),
        comparand.into_repr(),
        order,
    ))
}

/// Applies `Op` and returns the value before the update.
#[inline(always)]
pub unsafe fn fetch_op<Op: RmwOp, T: Integer>(cell: *mut T, value: T, order: MemoryOrder) -> T {
    T::from_repr(fetch_op_repr::<Op, T::Repr>(cell.cast(), value.into_repr(), order))
}

/// Applies `Op` and returns the value after the update.
#[inline(always)]
pub unsafe fn op_fetch<Op: RmwOp, T: Integer>(cell: *mut T, value: T, order: MemoryOrder) -> T {
    T::from_repr(op_fetch_repr::<Op, T::Repr>(cell.cast(), value.into_repr(), order))
}

macro_rules! named_rmw {
    ($($op:ident: $fetch_op:ident, $op_fetch:ident, $what:literal;)*) => {
        $(
            #[doc = concat!("Atomic ", $what, "; returns the previous value.")]
            #[inline(always)]
            pub unsafe fn $fetch_op<T: Integer>(cell: *mut T, value: T, order: MemoryOrder) -> T {
                fetch_op::<$op, T>(cell, value, order)
            }

            #[doc = concat!("Atomic ", $what, "; returns the new value.")]
            #[inline(always)]
            pub unsafe fn $op_fetch<T: Integer>(cell: *mut T, value: T, order: MemoryOrder) -> T {
                op_fetch::<$op, T>(cell, value, order)
            }
        )*
    };
}

named_rmw! {
    Add: fetch_add, add_fetch, "wrapping addition";
    Sub: fetch_sub, sub_fetch, "wrapping subtraction";
    And: fetch_and, and_fetch, "bitwise AND";
    Or: fetch_or, or_fetch, "bitwise OR";
    Xor: fetch_xor, xor_fetch, "bitwise XOR";
}

/// Atomically increments, returning the new value.
#[inline(always)]
pub unsafe fn inc<T: Integer>(cell: *mut T, order: MemoryOrder) -> T {
    add_fetch(cell, T::from_repr(T::Repr::one()), order)
}

/// Atomically decrements, returning the new value.
#[inline(always)]
pub unsafe fn dec<T: Integer>(cell: *mut T, order: MemoryOrder) -> T {
    sub_fetch(cell, T::from_repr(T::Repr::one()), order)
}

/// Atomically reads a pointer cell.
#[inline(always)]
pub unsafe fn load_ptr<U>(cell: *mut *mut U, order: MemoryOrder) -> *mut U {
    <*mut U>::from_repr(load_repr(cell.cast::<Word>(), order))
}

/// Atomically writes a pointer cell.
#[inline(always)]
pub unsafe fn store_ptr<U>(cell: *mut *mut U, value: *mut U, order: MemoryOrder) {
    store_repr(cell.cast::<Word>(), value.into_repr(), order);
}

/// Atomically replaces a pointer cell, returning the previous pointer.
#[inline(always)]
pub unsafe fn swap_ptr<U>(cell: *mut *mut U, value: *mut U, order: MemoryOrder) -> *mut U {
    <*mut U>::from_repr(swap_repr(cell.cast::<Word>(), value.into_repr(), order))
}

/// Pointer compare-and-swap, returning the pointer observed.
#[inline(always)]
pub unsafe fn compare_and_swap_ptr<U>(
    cell: *mut *mut U,
    value: *mut U,
    comparand: *mut U,
    order: MemoryOrder,
) -> *mut U {
    <*mut U>::from_repr(compare_and_swap_repr(
        cell.cast::<Word>(),
        value.into_repr(),
        comparand.into_repr(),
        order,
    ))
}

/// Atomically reads a 32-bit boolean cell. Any non-zero value is `true`.
#[inline(always)]
pub unsafe fn load_bool(cell: *mut i32, order: MemoryOrder) -> bool {
    bool::from_repr(load_repr(cell, order))
}

/// Atomically writes `0` or `1` to a 32-bit boolean cell.
#[inline(always)]
pub unsafe fn store_bool(cell: *mut i32, value: bool, order: MemoryOrder) {
    store_repr(cell, value.into_repr(), order);
}

/// Atomically replaces a 32-bit boolean cell, returning the previous value.
#[inline(always)]
pub unsafe fn swap_bool(cell: *mut i32, value: bool, order: MemoryOrder) -> bool {
    bool::from_repr(swap_repr(cell, value.into_repr(), order))
}

/// Boolean compare-and-swap on a 32-bit cell, returning the value observed.
///
/// The cell is compared against `0` or `1`; a cell holding any other non-zero
/// value never matches.
#[inline(always)]
pub unsafe fn compare_and_swap_bool(cell: *mut i32, value: bool, comparand: bool, order: MemoryOrder) -> bool {
    bool::from_repr(compare_and_swap_repr(
        cell,
        value.into_repr(),
        comparand.into_repr(),
        order,
    ))
}

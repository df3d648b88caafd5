//! Per-width primitive families and their build-time selection.
//!
//! Each family is a zero-sized type implementing [`Family`] (fences) and
//! [`Primitives<T>`] (the per-width operations). `build.rs` picks exactly one
//! family for the target and this module aliases it as [`Selected`]. Cells of a
//! given width reach their family through [`AtomicInt::Backend`], which lets
//! 64-bit cells go through the lock-based fallback on targets where 64-bit
//! atomics are missing or miscompiled while narrower widths stay lock-free.
//!
//! Dispatch is entirely static: no trait objects on these paths.

use core::fmt::Debug;
use core::sync::atomic::{self, Ordering};

use num_traits::{PrimInt, WrappingAdd, WrappingSub};

use crate::order::MemoryOrder;

pub mod lock;
pub mod rmw;

#[cfg(memorder_native_atomics)]
pub mod builtin;
#[cfg(memorder_native_atomics)]
pub mod legacy;
#[cfg(memorder_native_atomics)]
pub mod native;

pub use rmw::{Add, And, Or, RmwOp, Sub, Xor};

/// Identifies a primitive family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Ordering-aware builtins (`core::sync::atomic`).
    Builtin,
    /// Full-fence-only legacy builtins with emulated load/store/swap.
    Legacy,
    /// Host intrinsics selected per width and ordering token.
    Native,
    /// Process-wide lock around plain memory accesses.
    Lock,
}

/// Fence operations of a primitive family.
pub trait Family {
    /// Which family this is.
    const KIND: BackendKind;

    /// Compiler-only fence. No-op at `Relax`.
    #[inline(always)]
    fn compiler_fence(order: MemoryOrder) {
        if let Some(ordering) = order.for_fence() {
            atomic::compiler_fence(ordering);
        }
    }

    /// Compiler and hardware fence. No-op at `Relax`.
    fn thread_fence(order: MemoryOrder);
}

/// The per-width operation set of a primitive family.
///
/// # Safety
///
/// Every method requires `cell` to be non-null, aligned to `T`'s width, valid
/// for reads and writes for the duration of the call, and accessed by other
/// threads only through this crate at the same width.
pub trait Primitives<T>: Family {
    /// Reads the cell.
    unsafe fn load(cell: *mut T, order: MemoryOrder) -> T;

    /// Writes `value` to the cell.
    unsafe fn store(cell: *mut T, value: T, order: MemoryOrder);

    /// Writes `value` to the cell and returns the previous value.
    unsafe fn swap(cell: *mut T, value: T, order: MemoryOrder) -> T;

    /// Writes `value` if the cell holds `comparand`; returns the value observed.
    ///
    /// The same order governs success and failure. Never fails spuriously.
    unsafe fn compare_and_swap(cell: *mut T, value: T, comparand: T, order: MemoryOrder) -> T;

    /// Applies `Op` with `value` and returns the value before the update.
    unsafe fn fetch_op<Op: RmwOp>(cell: *mut T, value: T, order: MemoryOrder) -> T;
}

/// Integer widths that have a primitive family: `i8`, `i16`, `i32`, `i64`.
///
/// All other cell types are re-expressed through one of these.
pub trait AtomicInt:
    PrimInt + WrappingAdd + WrappingSub + Debug + Send + Sync + 'static
{
    /// Family servicing cells of this width.
    type Backend: Primitives<Self>;

    /// Zero-sized marker carrying the alignment atomic access requires.
    type Align: Copy + Default + Send + Sync + 'static;
}

/// Widths backed by a hardware atomic in `core::sync::atomic`.
///
/// Used by the builtin, legacy and native families; the lock-based fallback
/// needs nothing beyond [`AtomicInt`].
pub trait NativeAtomic: AtomicInt {
    /// The matching `core::sync::atomic` type.
    type Atomic: Send + Sync;

    /// Views a raw cell as its hardware atomic.
    ///
    /// # Safety
    ///
    /// `cell` must satisfy the [`Primitives`] contract and stay valid for `'a`.
    unsafe fn atomic<'a>(cell: *mut Self) -> &'a Self::Atomic;

    /// `load` on the hardware atomic.
    fn load(atomic: &Self::Atomic, order: Ordering) -> Self;
    /// `store` on the hardware atomic.
    fn store(atomic: &Self::Atomic, value: Self, order: Ordering);
    /// `swap` on the hardware atomic.
    fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    /// Strong `compare_exchange`, returning the observed value either way.
    fn compare_exchange(
        atomic: &Self::Atomic,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Self;
    /// `fetch_add` on the hardware atomic.
    fn fetch_add(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    /// `fetch_sub` on the hardware atomic.
    fn fetch_sub(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    /// `fetch_and` on the hardware atomic.
    fn fetch_and(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    /// `fetch_or` on the hardware atomic.
    fn fetch_or(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    /// `fetch_xor` on the hardware atomic.
    fn fetch_xor(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
}

macro_rules! align_markers {
    ($($name:ident => $align:literal),* $(,)?) => {
        $(
            #[doc(hidden)]
            #[repr(align($align))]
            #[derive(Clone, Copy, Debug, Default)]
            pub struct $name;
        )*
    };
}

align_markers!(Align1 => 1, Align2 => 2, Align4 => 4, Align8 => 8);

macro_rules! atomic_int {
    ($($int:ty => $backend:ty, $align:ty;)*) => {
        $(
            impl AtomicInt for $int {
                type Backend = $backend;
                type Align = $align;
            }
        )*
    };
}

atomic_int! {
    i8 => Selected, Align1;
    i16 => Selected, Align2;
    i32 => Selected, Align4;
    i64 => Selected64, Align8;
}

macro_rules! native_atomic {
    ($int:ty, $atomic:ty) => {
        impl NativeAtomic for $int {
            type Atomic = $atomic;

            #[inline(always)]
            unsafe fn atomic<'a>(cell: *mut Self) -> &'a $atomic {
                debug_assert_eq!(cell as usize % core::mem::align_of::<$atomic>(), 0);
                // SAFETY: caller guarantees a valid, suitably aligned cell.
                <$atomic>::from_ptr(cell)
            }

            #[inline(always)]
            fn load(atomic: &$atomic, order: Ordering) -> Self {
                atomic.load(order)
            }

            #[inline(always)]
            fn store(atomic: &$atomic, value: Self, order: Ordering) {
                atomic.store(value, order);
            }

            #[inline(always)]
            fn swap(atomic: &$atomic, value: Self, order: Ordering) -> Self {
                atomic.swap(value, order)
            }

            #[inline(always)]
            fn compare_exchange(
                atomic: &$atomic,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Self {
                match atomic.compare_exchange(current, new, success, failure) {
                    Ok(previous) | Err(previous) => previous,
                }
            }

            #[inline(always)]
            fn fetch_add(atomic: &$atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_add(value, order)
            }

            #[inline(always)]
            fn fetch_sub(atomic: &$atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_sub(value, order)
            }

            #[inline(always)]
            fn fetch_and(atomic: &$atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_and(value, order)
            }

            #[inline(always)]
            fn fetch_or(atomic: &$atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_or(value, order)
            }

            #[inline(always)]
            fn fetch_xor(atomic: &$atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_xor(value, order)
            }
        }
    };
}

#[cfg(target_has_atomic = "8")]
native_atomic!(i8, atomic::AtomicI8);
#[cfg(target_has_atomic = "16")]
native_atomic!(i16, atomic::AtomicI16);
#[cfg(target_has_atomic = "32")]
native_atomic!(i32, atomic::AtomicI32);
#[cfg(target_has_atomic = "64")]
native_atomic!(i64, atomic::AtomicI64);

/// The family chosen for this target.
#[cfg(memorder_backend = "builtin")]
pub type Selected = builtin::Builtin;
/// The family chosen for this target.
#[cfg(memorder_backend = "legacy")]
pub type Selected = legacy::Legacy;
/// The family chosen for this target.
#[cfg(memorder_backend = "native")]
pub type Selected = native::Native;
/// The family chosen for this target.
#[cfg(memorder_backend = "lock")]
pub type Selected = lock::Lock;

/// The family servicing 64-bit cells.
#[cfg(memorder_broken_64)]
pub type Selected64 = lock::Lock;
/// The family servicing 64-bit cells.
#[cfg(not(memorder_broken_64))]
pub type Selected64 = Selected;

/// Family used for 8, 16 and 32-bit cells and for fences.
pub const BACKEND: BackendKind = <Selected as Family>::KIND;

/// Family used for 64-bit cells.
pub const BACKEND_64: BackendKind = <Selected64 as Family>::KIND;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_family_is_all_or_nothing() {
        if BACKEND == BackendKind::Lock {
            assert_eq!(BACKEND_64, BackendKind::Lock);
        }
        assert!(BACKEND_64 == BACKEND || BACKEND_64 == BackendKind::Lock);
    }

    #[cfg(all(memorder_backend = "native", target_has_atomic = "64"))]
    #[test]
    fn native_intrinsics_keep_64_bit_cells_lock_free() {
        assert_eq!(BACKEND_64, BackendKind::Native);
    }

    #[cfg(all(
        memorder_backend = "builtin",
        target_pointer_width = "32",
        any(target_arch = "arm", target_arch = "mips", target_arch = "powerpc")
    ))]
    #[test]
    fn broken_builtin_families_route_64_bit_cells_to_the_lock() {
        assert_eq!(BACKEND_64, BackendKind::Lock);
    }

    #[cfg(all(memorder_backend = "builtin", target_pointer_width = "64"))]
    #[test]
    fn sixty_four_bit_hosts_keep_builtins() {
        assert_eq!(BACKEND_64, BackendKind::Builtin);
    }
}

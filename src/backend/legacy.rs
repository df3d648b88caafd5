//! Legacy full-fence builtins.
//!
//! The legacy family has no notion of ordering and no standalone load or
//! store: only a value-returning CAS and the five fetch-ops exist, and each
//! behaves as a full fence. Everything else is built from those two:
//!
//! - load is `fetch_add(0)`;
//! - store and swap retry a CAS against a relaxed read until the CAS observes
//!   the value that was read. The loop is unbounded and relies on no thread
//!   contending forever. Retries back off with bounded exponential spinning,
//!   which never yields or blocks.
//!
//! ARMv8 compilers, for both AArch64 and 32-bit ARMv8, have shipped legacy
//! builtins whose implied fences are incomplete, so an explicit fence follows
//! any `Strong` operation there.

use core::sync::atomic::{self, Ordering};

use crossbeam_utils::Backoff;

use super::{Add, BackendKind, Family, NativeAtomic, Primitives, RmwOp};
use crate::order::MemoryOrder;

/// Targets whose legacy builtins need an explicit fence for `Strong`.
const ARMV8: bool = cfg!(any(
    target_arch = "aarch64",
    all(target_arch = "arm", target_feature = "v8")
));

/// The legacy full-fence family.
#[derive(Clone, Copy, Debug, Default)]
pub struct Legacy;

impl Legacy {
    /// `__sync_val_compare_and_swap`: full-fence CAS returning the observed value.
    #[inline(always)]
    unsafe fn val_compare_and_swap<T: NativeAtomic>(cell: *mut T, comparand: T, value: T) -> T {
        T::compare_exchange(T::atomic(cell), comparand, value, Ordering::SeqCst, Ordering::SeqCst)
    }

    /// `__sync_fetch_and_<op>`: full-fence fetch-op.
    #[inline(always)]
    unsafe fn fetch_and_op<Op: RmwOp, T: NativeAtomic>(cell: *mut T, value: T) -> T {
        Op::fetch::<T>(T::atomic(cell), value, Ordering::SeqCst)
    }

    #[inline(always)]
    fn strong_fence(order: MemoryOrder) {
        if ARMV8 && order.is_strong() {
            Self::thread_fence(order);
        }
    }
}

impl Family for Legacy {
    const KIND: BackendKind = BackendKind::Legacy;

    #[inline(always)]
    fn thread_fence(order: MemoryOrder) {
        // `__sync_synchronize` is the only fence available.
        if order.for_fence().is_some() {
            atomic::fence(Ordering::SeqCst);
        }
    }
}

impl<T: NativeAtomic> Primitives<T> for Legacy {
    #[inline(always)]
    unsafe fn load(cell: *mut T, order: MemoryOrder) -> T {
        Self::strong_fence(order);
        <Self as Primitives<T>>::fetch_op::<Add>(cell, T::zero(), order)
    }

    #[inline(always)]
    unsafe fn store(cell: *mut T, value: T, order: MemoryOrder) {
        <Self as Primitives<T>>::swap(cell, value, order);
    }

    #[inline(always)]
    unsafe fn swap(cell: *mut T, value: T, order: MemoryOrder) -> T {
        let backoff = Backoff::new();
        loop {
            let previous = <Self as Primitives<T>>::load(cell, MemoryOrder::Relax);
            if <Self as Primitives<T>>::compare_and_swap(cell, value, previous, order) == previous {
                return previous;
            }
            backoff.spin();
        }
    }

    #[inline(always)]
    unsafe fn compare_and_swap(cell: *mut T, value: T, comparand: T, order: MemoryOrder) -> T {
        let previous = Self::val_compare_and_swap(cell, comparand, value);
        Self::strong_fence(order);
        previous
    }

    #[inline(always)]
    unsafe fn fetch_op<Op: RmwOp>(cell: *mut T, value: T, order: MemoryOrder) -> T {
        let previous = Self::fetch_and_op::<Op, T>(cell, value);
        Self::strong_fence(order);
        previous
    }
}

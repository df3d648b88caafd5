//! Host intrinsics.
//!
//! Each operation is dispatched on its ordering token to one intrinsic, the way
//! MSVC's `_InterlockedExchange_acq` / `_nf` / `_rel` families are used.
//! Fences are the architecture's barrier instruction: `mfence` on x86,
//! `dmb ish` on ARM. `Strong` appends that barrier.

use core::sync::atomic::{self, Ordering};

use super::{BackendKind, Family, NativeAtomic, Primitives, RmwOp};
use crate::order::MemoryOrder;

/// The native-intrinsic family.
#[derive(Clone, Copy, Debug, Default)]
pub struct Native;

/// Full hardware barrier, also a compiler barrier.
#[inline(always)]
pub fn barrier() {
    #[cfg(target_arch = "x86_64")]
    // SAFETY: SSE2 is part of the x86_64 baseline.
    unsafe {
        core::arch::x86_64::_mm_mfence();
    }
    #[cfg(all(target_arch = "x86", target_feature = "sse2"))]
    // SAFETY: guarded by the `sse2` target feature.
    unsafe {
        core::arch::x86::_mm_mfence();
    }
    #[cfg(any(target_arch = "aarch64", all(target_arch = "arm", target_feature = "v7")))]
    // SAFETY: `dmb ish` only orders memory accesses.
    unsafe {
        core::arch::asm!("dmb ish", options(nostack, preserves_flags));
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "x86", target_feature = "sse2"),
        target_arch = "aarch64",
        all(target_arch = "arm", target_feature = "v7"),
    )))]
    atomic::fence(Ordering::SeqCst);

    atomic::compiler_fence(Ordering::SeqCst);
}

#[inline(always)]
fn strong_barrier(order: MemoryOrder) {
    if order.is_strong() {
        barrier();
    }
}

impl Family for Native {
    const KIND: BackendKind = BackendKind::Native;

    #[inline(always)]
    fn thread_fence(order: MemoryOrder) {
        if order.for_fence().is_some() {
            barrier();
        }
    }
}

impl<T: NativeAtomic> Primitives<T> for Native {
    #[inline(always)]
    unsafe fn load(cell: *mut T, order: MemoryOrder) -> T {
        let atomic = T::atomic(cell);
        match order {
            MemoryOrder::Relax => T::load(atomic, Ordering::Relaxed),
            MemoryOrder::Acquire => T::load(atomic, Ordering::Acquire),
            MemoryOrder::Release | MemoryOrder::SeqCst => T::load(atomic, Ordering::SeqCst),
            MemoryOrder::Strong => {
                barrier();
                T::load(atomic, Ordering::SeqCst)
            }
        }
    }

    #[inline(always)]
    unsafe fn store(cell: *mut T, value: T, order: MemoryOrder) {
        let atomic = T::atomic(cell);
        match order {
            MemoryOrder::Relax => T::store(atomic, value, Ordering::Relaxed),
            MemoryOrder::Release => T::store(atomic, value, Ordering::Release),
            MemoryOrder::Acquire | MemoryOrder::SeqCst => T::store(atomic, value, Ordering::SeqCst),
            MemoryOrder::Strong => {
                T::store(atomic, value, Ordering::SeqCst);
                barrier();
            }
        }
    }

    #[inline(always)]
    unsafe fn swap(cell: *mut T, value: T, order: MemoryOrder) -> T {
        let atomic = T::atomic(cell);
        let previous = match order {
            MemoryOrder::Relax => T::swap(atomic, value, Ordering::Relaxed),
            MemoryOrder::Acquire => T::swap(atomic, value, Ordering::Acquire),
            MemoryOrder::Release => T::swap(atomic, value, Ordering::Release),
            MemoryOrder::SeqCst | MemoryOrder::Strong => T::swap(atomic, value, Ordering::SeqCst),
        };
        strong_barrier(order);
        previous
    }

    #[inline(always)]
    unsafe fn compare_and_swap(cell: *mut T, value: T, comparand: T, order: MemoryOrder) -> T {
        let atomic = T::atomic(cell);
        let previous = match order {
            MemoryOrder::Relax => {
                T::compare_exchange(atomic, comparand, value, Ordering::Relaxed, Ordering::Relaxed)
            }
            MemoryOrder::Acquire => {
                T::compare_exchange(atomic, comparand, value, Ordering::Acquire, Ordering::Acquire)
            }
            MemoryOrder::Release => {
                T::compare_exchange(atomic, comparand, value, Ordering::Release, Ordering::Relaxed)
            }
            MemoryOrder::SeqCst | MemoryOrder::Strong => {
                T::compare_exchange(atomic, comparand, value, Ordering::SeqCst, Ordering::SeqCst)
            }
        };
        strong_barrier(order);
        previous
    }

    #[inline(always)]
    unsafe fn fetch_op<Op: RmwOp>(cell: *mut T, value: T, order: MemoryOrder) -> T {
        let atomic = T::atomic(cell);
        let previous = match order {
            MemoryOrder::Relax => Op::fetch::<T>(atomic, value, Ordering::Relaxed),
            MemoryOrder::Acquire => Op::fetch::<T>(atomic, value, Ordering::Acquire),
            MemoryOrder::Release => Op::fetch::<T>(atomic, value, Ordering::Release),
            MemoryOrder::SeqCst | MemoryOrder::Strong => Op::fetch::<T>(atomic, value, Ordering::SeqCst),
        };
        strong_barrier(order);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Add, Xor};

    type N = Native;

    #[test]
    fn barrier_and_fences_do_not_fault() {
        barrier();
        for order in MemoryOrder::ALL {
            N::thread_fence(order);
            N::compiler_fence(order);
        }
    }

    #[test]
    fn every_order_token_dispatches() {
        let mut cell = 0i32;
        for order in MemoryOrder::ALL {
            unsafe {
                let before = <N as Primitives<i32>>::load(&mut cell, order);
                assert_eq!(<N as Primitives<i32>>::fetch_op::<Add>(&mut cell, 3, order), before);
                assert_eq!(<N as Primitives<i32>>::compare_and_swap(&mut cell, 0, before + 3, order), before + 3);
                assert_eq!(<N as Primitives<i32>>::swap(&mut cell, before + 3, order), 0);
                <N as Primitives<i32>>::store(&mut cell, before + 3, order);
            }
        }
        assert_eq!(cell, 15);
    }

    #[test]
    fn narrow_widths() {
        let mut byte = 0x55i8;
        let mut half = 0x0F0Fi16;
        unsafe {
            assert_eq!(<N as Primitives<i8>>::fetch_op::<Xor>(&mut byte, -1, MemoryOrder::SeqCst), 0x55);
            assert_eq!(<N as Primitives<i16>>::swap(&mut half, -1, MemoryOrder::Acquire), 0x0F0F);
        }
        assert_eq!(byte, !0x55);
        assert_eq!(half, -1);
    }
}

//! Ordering-aware builtins: `core::sync::atomic` with an explicit `Ordering`.
//!
//! Rust has no encoding for `Strong`, so a `SeqCst` fence is issued before a
//! strong load and after every other strong operation.

use core::sync::atomic::{self, Ordering};

use super::{BackendKind, Family, NativeAtomic, Primitives, RmwOp};
use crate::order::MemoryOrder;

/// The ordering-aware builtin family.
#[derive(Clone, Copy, Debug, Default)]
pub struct Builtin;

#[inline(always)]
fn strong_fence(order: MemoryOrder) {
    if order.is_strong() {
        atomic::fence(Ordering::SeqCst);
    }
}

impl Family for Builtin {
    const KIND: BackendKind = BackendKind::Builtin;

    #[inline(always)]
    fn thread_fence(order: MemoryOrder) {
        // For a standalone fence SeqCst already has Strong semantics.
        if let Some(ordering) = order.for_fence() {
            atomic::fence(ordering);
        }
    }
}

impl<T: NativeAtomic> Primitives<T> for Builtin {
    #[inline(always)]
    unsafe fn load(cell: *mut T, order: MemoryOrder) -> T {
        strong_fence(order);
        T::load(T::atomic(cell), order.for_load())
    }

    #[inline(always)]
    unsafe fn store(cell: *mut T, value: T, order: MemoryOrder) {
        T::store(T::atomic(cell), value, order.for_store());
        strong_fence(order);
    }

    #[inline(always)]
    unsafe fn swap(cell: *mut T, value: T, order: MemoryOrder) -> T {
        let previous = T::swap(T::atomic(cell), value, order.for_rmw());
        strong_fence(order);
        previous
    }

    #[inline(always)]
    unsafe fn compare_and_swap(cell: *mut T, value: T, comparand: T, order: MemoryOrder) -> T {
        let previous = T::compare_exchange(
            T::atomic(cell),
            comparand,
            value,
            order.for_rmw(),
            order.for_cas_failure(),
        );
        strong_fence(order);
        previous
    }

    #[inline(always)]
    unsafe fn fetch_op<Op: RmwOp>(cell: *mut T, value: T, order: MemoryOrder) -> T {
        let previous = Op::fetch::<T>(T::atomic(cell), value, order.for_rmw());
        strong_fence(order);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Add, And, Or, Sub, Xor};

    type B = Builtin;

    #[test]
    fn load_store_every_order() {
        let mut cell = 0i32;
        for (i, order) in MemoryOrder::ALL.into_iter().enumerate() {
            let value = i32::try_from(i).unwrap() * 7 - 3;
            unsafe {
                <B as Primitives<i32>>::store(&mut cell, value, order);
                assert_eq!(<B as Primitives<i32>>::load(&mut cell, order), value);
            }
        }
    }

    #[test]
    fn compare_and_swap_returns_observed_value() {
        let mut cell = 10i16;
        unsafe {
            assert_eq!(<B as Primitives<i16>>::compare_and_swap(&mut cell, 20, 11, MemoryOrder::SeqCst), 10);
            assert_eq!(cell, 10);
            assert_eq!(<B as Primitives<i16>>::compare_and_swap(&mut cell, 20, 10, MemoryOrder::Release), 10);
        }
        assert_eq!(cell, 20);
    }

    #[test]
    fn fetch_ops_return_previous() {
        let mut cell = 0b0110i8;
        unsafe {
            assert_eq!(<B as Primitives<i8>>::fetch_op::<Add>(&mut cell, 1, MemoryOrder::Relax), 0b0110);
            assert_eq!(<B as Primitives<i8>>::fetch_op::<Sub>(&mut cell, 1, MemoryOrder::Acquire), 0b0111);
            assert_eq!(<B as Primitives<i8>>::fetch_op::<And>(&mut cell, 0b0011, MemoryOrder::Release), 0b0110);
            assert_eq!(<B as Primitives<i8>>::fetch_op::<Or>(&mut cell, 0b1000, MemoryOrder::SeqCst), 0b0010);
            assert_eq!(<B as Primitives<i8>>::fetch_op::<Xor>(&mut cell, 0b1111, MemoryOrder::Strong), 0b1010);
        }
        assert_eq!(cell, 0b0101);
    }

    #[cfg(target_has_atomic = "64")]
    #[test]
    fn swap_64() {
        let mut cell = i64::MIN;
        unsafe {
            assert_eq!(<B as Primitives<i64>>::swap(&mut cell, i64::MAX, MemoryOrder::Strong), i64::MIN);
        }
        assert_eq!(cell, i64::MAX);
    }
}

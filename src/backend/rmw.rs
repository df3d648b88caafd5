//! Read-modify-write operators.
//!
//! Families implement a single generic `fetch_op` and pick the operator by type,
//! so the five fetch-ops share one body per family.

use core::sync::atomic::Ordering;

use super::{AtomicInt, NativeAtomic};

/// An operator usable in `fetch_op` / `op_fetch`.
pub trait RmwOp {
    /// Computes the updated value. Arithmetic wraps.
    fn apply<T: AtomicInt>(current: T, operand: T) -> T;

    /// Performs the operator on a hardware atomic, returning the previous value.
    fn fetch<T: NativeAtomic>(atomic: &T::Atomic, operand: T, order: Ordering) -> T;
}

/// Wrapping addition.
#[derive(Clone, Copy, Debug)]
pub enum Add {}

/// Wrapping subtraction.
#[derive(Clone, Copy, Debug)]
pub enum Sub {}

/// Bitwise AND.
#[derive(Clone, Copy, Debug)]
pub enum And {}

/// Bitwise OR.
#[derive(Clone, Copy, Debug)]
pub enum Or {}

/// Bitwise XOR.
#[derive(Clone, Copy, Debug)]
pub enum Xor {}

impl RmwOp for Add {
    #[inline(always)]
    fn apply<T: AtomicInt>(current: T, operand: T) -> T {
        current.wrapping_add(&operand)
    }

    #[inline(always)]
    fn fetch<T: NativeAtomic>(atomic: &T::Atomic, operand: T, order: Ordering) -> T {
        T::fetch_add(atomic, operand, order)
    }
}

impl RmwOp for Sub {
    #[inline(always)]
    fn apply<T: AtomicInt>(current: T, operand: T) -> T {
        current.wrapping_sub(&operand)
    }

    #[inline(always)]
    fn fetch<T: NativeAtomic>(atomic: &T::Atomic, operand: T, order: Ordering) -> T {
        T::fetch_sub(atomic, operand, order)
    }
}

impl RmwOp for And {
    #[inline(always)]
    fn apply<T: AtomicInt>(current: T, operand: T) -> T {
        current & operand
    }

    #[inline(always)]
    fn fetch<T: NativeAtomic>(atomic: &T::Atomic, operand: T, order: Ordering) -> T {
        T::fetch_and(atomic, operand, order)
    }
}

impl RmwOp for Or {
    #[inline(always)]
    fn apply<T: AtomicInt>(current: T, operand: T) -> T {
        current | operand
    }

    #[inline(always)]
    fn fetch<T: NativeAtomic>(atomic: &T::Atomic, operand: T, order: Ordering) -> T {
        T::fetch_or(atomic, operand, order)
    }
}

impl RmwOp for Xor {
    #[inline(always)]
    fn apply<T: AtomicInt>(current: T, operand: T) -> T {
        current ^ operand
    }

    #[inline(always)]
    fn fetch<T: NativeAtomic>(atomic: &T::Atomic, operand: T, order: Ordering) -> T {
        T::fetch_xor(atomic, operand, order)
    }
}

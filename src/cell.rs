//! A typed atomic cell over caller-owned storage.
//!
//! The cell is a thin wrapper around its primitive repr: an `AtomicCell<u16>`
//! is two bytes, an `AtomicCell<bool>` is a 32-bit slot, and an
//! `AtomicCell<*mut T>` is one word. It never allocates; place it in a struct,
//! a static or a raw buffer (via [`AtomicCell::from_ptr`]).

use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;

use crate::backend::{Add, And, AtomicInt, Or, RmwOp, Sub, Xor};
use crate::ops::{self, CellValue, Integer};
use crate::order::MemoryOrder;

/// An atomic cell holding a `T`, stored as `T::Repr`.
#[repr(C)]
pub struct AtomicCell<T: CellValue> {
    value: UnsafeCell<T::Repr>,
    _align: [<T::Repr as AtomicInt>::Align; 0],
    _marker: PhantomData<T>,
}

// SAFETY: all access to `value` goes through the atomic primitives.
unsafe impl<T: CellValue> Send for AtomicCell<T> {}
unsafe impl<T: CellValue> Sync for AtomicCell<T> {}

impl<T: CellValue> AtomicCell<T> {
    /// Creates a new cell.
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value.into_repr()),
            _align: [],
            _marker: PhantomData,
        }
    }

    /// Views caller-owned memory as a cell.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, aligned to `align_of::<AtomicCell<T>>()`, valid
    /// for reads and writes for `'a`, and only accessed atomically at this
    /// width while the returned reference is alive.
    #[inline]
    pub unsafe fn from_ptr<'a>(ptr: *mut T::Repr) -> &'a Self {
        debug_assert_eq!(ptr as usize % core::mem::align_of::<Self>(), 0);
        // SAFETY: `AtomicCell<T>` is `repr(C)` with the repr as its only sized field.
        &*ptr.cast::<Self>()
    }

    /// Raw pointer to the underlying storage.
    #[inline]
    pub const fn as_ptr(&self) -> *mut T::Repr {
        self.value.get()
    }

    /// Consumes the cell, returning the value.
    #[inline]
    pub fn into_inner(self) -> T {
        T::from_repr(self.value.into_inner())
    }

    /// Atomically reads the value.
    #[inline(always)]
    pub fn load(&self, order: MemoryOrder) -> T {
        // SAFETY: `self` owns a valid, aligned repr for its lifetime.
        T::from_repr(unsafe { ops::load_repr(self.as_ptr(), order) })
    }

    /// Atomically writes `value`.
    #[inline(always)]
    pub fn store(&self, value: T, order: MemoryOrder) {
        unsafe { ops::store_repr(self.as_ptr(), value.into_repr(), order) }
    }

    /// Atomically replaces the value, returning the previous one.
    #[inline(always)]
    pub fn swap(&self, value: T, order: MemoryOrder) -> T {
        T::from_repr(unsafe { ops::swap_repr(self.as_ptr(), value.into_repr(), order) })
    }

    /// Writes `value` if the cell holds `comparand`; returns the value observed.
    ///
    /// The write happened iff the returned value equals `comparand`.
    #[inline(always)]
    pub fn compare_and_swap(&self, value: T, comparand: T, order: MemoryOrder) -> T {
        T::from_repr(unsafe {
            ops::compare_and_swap_repr(self.as_ptr(), value.into_repr(), comparand.into_repr(), order)
        })
    }
}

impl<T: Integer> AtomicCell<T> {
    /// Mutable reference to the value through exclusive access.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: `Integer` guarantees `T` and `T::Repr` share size and
        // alignment, and every repr bit pattern is a valid integer.
        unsafe { &mut *(self.value.get_mut() as *mut T::Repr).cast::<T>() }
    }

    /// Applies `Op`, returning the previous value.
    #[inline(always)]
    pub fn fetch_op<Op: RmwOp>(&self, value: T, order: MemoryOrder) -> T {
        T::from_repr(unsafe { ops::fetch_op_repr::<Op, T::Repr>(self.as_ptr(), value.into_repr(), order) })
    }

    /// Applies `Op`, returning the new value.
    #[inline(always)]
    pub fn op_fetch<Op: RmwOp>(&self, value: T, order: MemoryOrder) -> T {
        T::from_repr(unsafe { ops::op_fetch_repr::<Op, T::Repr>(self.as_ptr(), value.into_repr(), order) })
    }

    /// Wrapping add; returns the previous value.
    #[inline(always)]
    pub fn fetch_add(&self, value: T, order: MemoryOrder) -> T {
        self.fetch_op::<Add>(value, order)
    }

    /// Wrapping subtract; returns the previous value.
    #[inline(always)]
    pub fn fetch_sub(&self, value: T, order: MemoryOrder) -> T {
        self.fetch_op::<Sub>(value, order)
    }

    /// Bitwise AND; returns the previous value.
    #[inline(always)]
    pub fn fetch_and(&self, value: T, order: MemoryOrder) -> T {
        self.fetch_op::<And>(value, order)
    }

    /// Bitwise OR; returns the previous value.
    #[inline(always)]
    pub fn fetch_or(&self, value: T, order: MemoryOrder) -> T {
        self.fetch_op::<Or>(value, order)
    }

    /// Bitwise XOR; returns the previous value.
    #[inline(always)]
    pub fn fetch_xor(&self, value: T, order: MemoryOrder) -> T {
        self.fetch_op::<Xor>(value, order)
    }

    /// Wrapping add; returns the new value.
    #[inline(always)]
    pub fn add_fetch(&self, value: T, order: MemoryOrder) -> T {
        self.op_fetch::<Add>(value, order)
    }

    /// Wrapping subtract; returns the new value.
    #[inline(always)]
    pub fn sub_fetch(&self, value: T, order: MemoryOrder) -> T {
        self.op_fetch::<Sub>(value, order)
    }

    /// Bitwise AND; returns the new value.
    #[inline(always)]
    pub fn and_fetch(&self, value: T, order: MemoryOrder) -> T {
        self.op_fetch::<And>(value, order)
    }

    /// Bitwise OR; returns the new value.
    #[inline(always)]
    pub fn or_fetch(&self, value: T, order: MemoryOrder) -> T {
        self.op_fetch::<Or>(value, order)
    }

    /// Bitwise XOR; returns the new value.
    #[inline(always)]
    pub fn xor_fetch(&self, value: T, order: MemoryOrder) -> T {
        self.op_fetch::<Xor>(value, order)
    }

    /// Increments, returning the new value.
    #[inline(always)]
    pub fn inc(&self, order: MemoryOrder) -> T {
        // SAFETY: `self` owns a valid, aligned repr whose layout matches `T`.
        unsafe { ops::inc(self.as_ptr().cast::<T>(), order) }
    }

    /// Decrements, returning the new value.
    #[inline(always)]
    pub fn dec(&self, order: MemoryOrder) -> T {
        unsafe { ops::dec(self.as_ptr().cast::<T>(), order) }
    }
}

impl<T: CellValue + Default> Default for AtomicCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: CellValue> From<T> for AtomicCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: CellValue + fmt::Debug> fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCell").field(&self.load(MemoryOrder::Relax)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{align_of, size_of};

    #[test]
    fn layout_matches_repr() {
        assert_eq!(size_of::<AtomicCell<u8>>(), 1);
        assert_eq!(size_of::<AtomicCell<i16>>(), 2);
        assert_eq!(size_of::<AtomicCell<bool>>(), 4);
        assert_eq!(size_of::<AtomicCell<u64>>(), 8);
        assert_eq!(align_of::<AtomicCell<u64>>(), 8);
        assert_eq!(size_of::<AtomicCell<*mut u8>>(), size_of::<usize>());
    }

    #[test]
    fn from_ptr_views_caller_memory() {
        let mut slots = [0i32; 4];
        let cell = unsafe { AtomicCell::<u32>::from_ptr(slots.as_mut_ptr().add(2)) };
        cell.store(u32::MAX, MemoryOrder::Release);
        assert_eq!(cell.fetch_and(0xFF, MemoryOrder::SeqCst), u32::MAX);
        assert_eq!(slots[2], 0xFF);
    }

    #[test]
    fn get_mut_writes_through() {
        let mut cell = AtomicCell::new(u16::MAX);
        *cell.get_mut() -= 1;
        assert_eq!(cell.load(MemoryOrder::Relax), u16::MAX - 1);
        *cell.get_mut() = 3;
        assert_eq!(cell.into_inner(), 3);
    }

    #[test]
    fn debug_shows_value() {
        let cell = AtomicCell::new(7u16);
        assert_eq!(format!("{cell:?}"), "AtomicCell(7)");
    }
}

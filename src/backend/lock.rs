//! Lock-based fallback.
//!
//! Every operation takes one process-wide mutex, performs a plain
//! read-modify-write and releases it. Used on its own where the target has no
//! usable atomics, and for 64-bit cells where 64-bit builtins are missing or
//! miscompiled.
//!
//! These paths block. They must not be reached from signal handlers or other
//! contexts that cannot wait on a lock. Mixing widths on one cell is not atomic
//! either: a 32-bit access does not take this lock.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use super::{AtomicInt, BackendKind, Family, Primitives, RmwOp, BACKEND, BACKEND_64};
use crate::order::MemoryOrder;

/// The lock-based family.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lock;

static FALLBACK_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Acquires the fallback lock, initializing it on first use.
#[inline]
fn acquire() -> MutexGuard<'static, ()> {
    FALLBACK_LOCK
        .get_or_init(new_fallback_lock)
        .lock()
        // The lock guards no data of its own.
        .unwrap_or_else(PoisonError::into_inner)
}

#[cold]
fn new_fallback_lock() -> Mutex<()> {
    tracing::debug!(
        backend = ?BACKEND,
        backend_64 = ?BACKEND_64,
        "initializing lock-based atomic fallback"
    );
    Mutex::new(())
}

impl Family for Lock {
    const KIND: BackendKind = BackendKind::Lock;

    fn thread_fence(order: MemoryOrder) {
        if order.for_fence().is_none() {
            return;
        }
        Self::compiler_fence(MemoryOrder::Strong);
        drop(acquire());
        Self::compiler_fence(MemoryOrder::Strong);
    }
}

impl<T: AtomicInt> Primitives<T> for Lock {
    unsafe fn load(cell: *mut T, _order: MemoryOrder) -> T {
        let _guard = acquire();
        cell.read()
    }

    unsafe fn store(cell: *mut T, value: T, _order: MemoryOrder) {
        let _guard = acquire();
        cell.write(value);
    }

    unsafe fn swap(cell: *mut T, value: T, _order: MemoryOrder) -> T {
        let _guard = acquire();
        cell.replace(value)
    }

    unsafe fn compare_and_swap(cell: *mut T, value: T, comparand: T, _order: MemoryOrder) -> T {
        let _guard = acquire();
        let previous = cell.read();
        if previous == comparand {
            cell.write(value);
        }
        previous
    }

    unsafe fn fetch_op<Op: RmwOp>(cell: *mut T, value: T, _order: MemoryOrder) -> T {
        let _guard = acquire();
        let previous = cell.read();
        cell.write(Op::apply(previous, value));
        previous
    }
}

//! Memory-ordering vocabulary and the two local fences.
//!
//! `MemoryOrder` follows the C++11 model with one addition, [`MemoryOrder::Strong`],
//! which requests a full fence on both sides of the operation. That is the
//! behaviour of the legacy full-fence builtins, and code written against them
//! can keep its assumptions by asking for `Strong`.
//!
//! Rust rejects a few (operation, ordering) pairs at runtime, such as a
//! `Release` load. The `for_*` helpers map every `MemoryOrder` to an ordering
//! that is legal for the operation and at least as strong as requested.

use core::sync::atomic::Ordering;

use crate::backend::{Family, Selected};

/// Ordering constraint attached to an atomic operation or fence.
///
/// The discriminants are private to this crate and carry no meaning across
/// platforms; do not persist or compare them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryOrder {
    /// Atomicity only; no ordering with respect to other accesses.
    Relax,
    /// Later accesses are not reordered before this operation.
    Acquire,
    /// Earlier accesses are not reordered after this operation.
    Release,
    /// Participates in a single total order of sequentially consistent operations.
    SeqCst,
    /// Full fence before and after the operation, regardless of its direction.
    Strong,
}

impl MemoryOrder {
    /// Every ordering, weakest first.
    pub const ALL: [MemoryOrder; 5] = [
        MemoryOrder::Relax,
        MemoryOrder::Acquire,
        MemoryOrder::Release,
        MemoryOrder::SeqCst,
        MemoryOrder::Strong,
    ];

    /// Returns `true` for [`MemoryOrder::Strong`].
    #[inline(always)]
    pub const fn is_strong(self) -> bool {
        matches!(self, MemoryOrder::Strong)
    }

    /// Ordering for a plain atomic load.
    #[inline(always)]
    pub const fn for_load(self) -> Ordering {
        match self {
            MemoryOrder::Relax => Ordering::Relaxed,
            MemoryOrder::Acquire => Ordering::Acquire,
            MemoryOrder::Release | MemoryOrder::SeqCst | MemoryOrder::Strong => Ordering::SeqCst,
        }
    }

    /// Ordering for a plain atomic store.
    #[inline(always)]
    pub const fn for_store(self) -> Ordering {
        match self {
            MemoryOrder::Relax => Ordering::Relaxed,
            MemoryOrder::Release => Ordering::Release,
            MemoryOrder::Acquire | MemoryOrder::SeqCst | MemoryOrder::Strong => Ordering::SeqCst,
        }
    }

    /// Ordering for a read-modify-write (swap, fetch-op, CAS success).
    #[inline(always)]
    pub const fn for_rmw(self) -> Ordering {
        match self {
            MemoryOrder::Relax => Ordering::Relaxed,
            MemoryOrder::Acquire => Ordering::Acquire,
            MemoryOrder::Release => Ordering::Release,
            MemoryOrder::SeqCst | MemoryOrder::Strong => Ordering::SeqCst,
        }
    }

    /// Failure ordering paired with [`for_rmw`](Self::for_rmw) in a CAS.
    ///
    /// A failed CAS is a load, so `Release` degrades to `Relaxed`.
    #[inline(always)]
    pub const fn for_cas_failure(self) -> Ordering {
        match self {
            MemoryOrder::Relax | MemoryOrder::Release => Ordering::Relaxed,
            MemoryOrder::Acquire => Ordering::Acquire,
            MemoryOrder::SeqCst | MemoryOrder::Strong => Ordering::SeqCst,
        }
    }

    /// Ordering for a fence, or `None` when the fence is a no-op.
    #[inline(always)]
    pub const fn for_fence(self) -> Option<Ordering> {
        match self {
            MemoryOrder::Relax => None,
            MemoryOrder::Acquire => Some(Ordering::Acquire),
            MemoryOrder::Release => Some(Ordering::Release),
            MemoryOrder::SeqCst | MemoryOrder::Strong => Some(Ordering::SeqCst),
        }
    }
}

/// Forbids the compiler from reordering memory accesses across this point.
///
/// Emits no instructions. No-op at [`MemoryOrder::Relax`].
#[inline(always)]
pub fn compiler_fence(order: MemoryOrder) {
    Selected::compiler_fence(order);
}

/// Forbids both the compiler and the CPU from reordering memory accesses
/// across this point, as seen by other threads.
///
/// No-op at [`MemoryOrder::Relax`]. `SeqCst` and `Strong` are equivalent here.
#[inline(always)]
pub fn thread_fence(order: MemoryOrder) {
    Selected::thread_fence(order);
}

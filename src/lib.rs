//! # `memorder` - Portable Atomic Memory Operations
//!
//! Atomic loads, stores, swaps, compare-and-swap and fetch-ops on 8, 16, 32 and
//! 64-bit integers, pointers and booleans, with an explicit [`MemoryOrder`] on
//! every call. A fixed operation vocabulary is mapped onto whichever primitive
//! family the target supports, so runtime code written once behaves the same on
//! every platform.
//!
//! ## Architecture
//!
//! The crate is stratified:
//!
//! 1. **Ordering vocabulary** ([`order`]): `Relax`, `Acquire`, `Release`,
//!    `SeqCst` and `Strong`, the last being a full fence on both sides.
//! 2. **Primitive families** ([`backend`]): exactly one is selected at build time.
//!    - *builtin*: ordering-aware builtins, `Strong` adds a trailing fence;
//!    - *legacy*: full-fence builtins only, load/store/swap emulated;
//!    - *native*: host intrinsics chosen per ordering token;
//!    - *lock*: one process-wide mutex, for targets without atomics and for
//!      64-bit cells where 64-bit atomics are missing or miscompiled.
//! 3. **Composition** ([`ops`], [`cell`]): unsigned, word, pointer and boolean
//!    cells, op-fetch variants and `inc`/`dec`, all derived from the selected
//!    family's primitives.
//! 4. **Process-wide fence** ([`fence`]): a fence every thread of the process
//!    observes, for asymmetric synchronization.
//!
//! ## Configuration
//!
//! The family is chosen by `build.rs` from the target. Enable one of the
//! `backend-builtin`, `backend-legacy`, `backend-native` or `backend-lock`
//! features to force a family; enabling more than one is a build error.
//! [`BACKEND`] and [`BACKEND_64`] report what was chosen.
//!
//! ## Diagnostics
//!
//! Cold paths (fence capability probing, fallback lock initialization) emit
//! `tracing` events at `debug`; the page-protection fence emits a `trace`
//! event per call. Nothing is logged on hot paths.
//!
//! ## Example
//!
//! ```rust
//! use memorder::{AtomicCell, MemoryOrder};
//!
//! let refs = AtomicCell::new(1u32);
//! assert_eq!(refs.inc(MemoryOrder::SeqCst), 2);
//! assert_eq!(refs.fetch_sub(1, MemoryOrder::Release), 2);
//! assert_eq!(refs.compare_and_swap(9, 1, MemoryOrder::Strong), 1);
//! assert_eq!(refs.load(MemoryOrder::Acquire), 9);
//!
//! memorder::process_fence();
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::inline_always)]

pub mod backend;
pub mod cell;
pub mod fence;
pub mod ops;
pub mod order;
mod sys;
#[cfg(test)]
mod testing;

pub use backend::{BackendKind, BACKEND, BACKEND_64};
pub use cell::AtomicCell;
pub use fence::{capability, process_fence, FenceCapability};
pub use ops::{CellValue, Integer, Word};
pub use order::{compiler_fence, thread_fence, MemoryOrder};

// Compile-time assertions for cell layout
const _: () = {
    use core::mem;

    // A cell is exactly its repr; it can overlay caller-owned memory.
    assert!(mem::size_of::<AtomicCell<i8>>() == 1);
    assert!(mem::size_of::<AtomicCell<u16>>() == 2);
    assert!(mem::size_of::<AtomicCell<u32>>() == 4);
    assert!(mem::size_of::<AtomicCell<i64>>() == 8);
    assert!(mem::size_of::<AtomicCell<usize>>() == mem::size_of::<usize>());
    assert!(mem::size_of::<AtomicCell<*mut u8>>() == mem::size_of::<*mut u8>());

    // Booleans occupy a 32-bit slot.
    assert!(mem::size_of::<AtomicCell<bool>>() == 4);

    // 64-bit cells are naturally aligned even where `u64` is not.
    assert!(mem::align_of::<AtomicCell<u64>>() == 8);
    assert!(mem::align_of::<AtomicCell<usize>>() == mem::align_of::<usize>());
};

//! Thin OS wrappers used by the process-wide fence.

#[cfg(all(unix, not(target_family = "wasm")))]
pub mod unix;

#[cfg(windows)]
pub mod windows;

#[cfg(all(unix, not(target_family = "wasm")))]
pub use unix::*;

#[cfg(windows)]
pub use windows::*;

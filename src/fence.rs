//! Process-wide fence.
//!
//! [`thread_fence`](crate::thread_fence) orders the caller's accesses only.
//! [`process_fence`] additionally forces every other thread of the process
//! through a full barrier, so a hot path elsewhere can get away with a compiler
//! fence while a rare writer pays for both sides.
//!
//! Capabilities are probed once, on first use:
//!
//! - Linux/Android: `membarrier(2)`, preferring the private expedited command
//!   (registered during the probe) over the global one.
//! - Windows: `FlushProcessWriteBuffers`, always available.
//! - WebAssembly: one thread per instance, nothing to do.
//! - Elsewhere, or when the syscall is missing or fails: under a dedicated
//!   lock, dirty a private scratch page and revoke all access to it. The
//!   kernel has to shoot down stale TLB entries on every core running the
//!   process, and the interrupt that does so drains each core's store buffer.
//!   This is slow and serialized, and exists only for correctness.

use std::sync::OnceLock;

use crate::backend::{BACKEND, BACKEND_64};

#[cfg(all(unix, not(target_family = "wasm")))]
use core::ptr::NonNull;
#[cfg(all(unix, not(target_family = "wasm")))]
use std::sync::{Mutex, PoisonError};

#[cfg(all(unix, not(target_family = "wasm")))]
use crate::{ops, order::MemoryOrder, sys};

static CAPABILITY: OnceLock<FenceCapability> = OnceLock::new();

/// What the process-wide fence can use on this system. Detected once.
#[derive(Debug)]
pub struct FenceCapability {
    membarrier_local: bool,
    membarrier_global: bool,
    #[cfg(all(unix, not(target_family = "wasm")))]
    slow: SlowFence,
}

/// Lock and scratch page for the page-protection fence.
#[cfg(all(unix, not(target_family = "wasm")))]
#[derive(Debug)]
struct SlowFence {
    lock: Mutex<()>,
    page: NonNull<u8>,
    page_len: usize,
}

// SAFETY: the page is only touched while holding `lock`.
#[cfg(all(unix, not(target_family = "wasm")))]
unsafe impl Send for SlowFence {}
#[cfg(all(unix, not(target_family = "wasm")))]
unsafe impl Sync for SlowFence {}

#[cfg(all(unix, not(target_family = "wasm")))]
impl SlowFence {
    fn new() -> Self {
        let page_len = sys::page_size();
        // SAFETY: plain anonymous mapping; never unmapped.
        let page = unsafe { sys::allocate_region(page_len) };
        let page = page.unwrap_or_else(|| {
            panic!("process fence: failed to map scratch page: {}", std::io::Error::last_os_error())
        });
        Self {
            lock: Mutex::new(()),
            page,
            page_len,
        }
    }

    fn fence(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // SAFETY: `page` is our own mapping of `page_len` bytes.
        unsafe {
            assert!(
                sys::protect_region(self.page, self.page_len, sys::Protection::ReadWrite),
                "process fence: mprotect(PROT_READ | PROT_WRITE) failed: {}",
                std::io::Error::last_os_error()
            );
            // Dirty the page so the kernel cannot skip the shootdown.
            ops::store::<usize>(self.page.as_ptr().cast(), 1, MemoryOrder::Strong);
            assert!(
                sys::protect_region(self.page, self.page_len, sys::Protection::NoAccess),
                "process fence: mprotect(PROT_NONE) failed: {}",
                std::io::Error::last_os_error()
            );
        }
    }
}

impl FenceCapability {
    fn detect() -> Self {
        let (membarrier_local, membarrier_global) = probe_membarrier();
        let capability = Self {
            membarrier_local,
            membarrier_global,
            #[cfg(all(unix, not(target_family = "wasm")))]
            slow: SlowFence::new(),
        };
        tracing::debug!(
            backend = ?BACKEND,
            backend_64 = ?BACKEND_64,
            membarrier_local,
            membarrier_global,
            accelerated = capability.is_accelerated(),
            "process fence capabilities detected"
        );
        capability
    }

    /// `membarrier` private expedited mode is registered and usable.
    pub fn membarrier_local(&self) -> bool {
        self.membarrier_local
    }

    /// `membarrier` global mode is supported.
    pub fn membarrier_global(&self) -> bool {
        self.membarrier_global
    }

    /// Whether [`process_fence`] normally avoids the page-protection path.
    pub fn is_accelerated(&self) -> bool {
        cfg!(any(windows, target_family = "wasm")) || self.membarrier_local || self.membarrier_global
    }

    fn fence(&self) {
        if !self.fast_fence() {
            self.slow_fence();
        }
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn fast_fence(&self) -> bool {
        use sys::membarrier_cmd::{GLOBAL, PRIVATE_EXPEDITED};

        (self.membarrier_local && sys::membarrier(PRIVATE_EXPEDITED).is_ok())
            || (self.membarrier_global && sys::membarrier(GLOBAL).is_ok())
    }

    #[cfg(windows)]
    fn fast_fence(&self) -> bool {
        crate::sys::flush_process_write_buffers();
        true
    }

    #[cfg(target_family = "wasm")]
    fn fast_fence(&self) -> bool {
        true
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", windows, target_family = "wasm")))]
    fn fast_fence(&self) -> bool {
        false
    }

    #[cfg(all(unix, not(target_family = "wasm")))]
    pub(crate) fn slow_fence(&self) {
        tracing::trace!("process fence: page-protection fallback");
        self.slow.fence();
    }

    #[cfg(not(all(unix, not(target_family = "wasm"))))]
    pub(crate) fn slow_fence(&self) {
        crate::thread_fence(crate::MemoryOrder::Strong);
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn probe_membarrier() -> (bool, bool) {
    use sys::membarrier_cmd::{GLOBAL, QUERY, REGISTER_PRIVATE_EXPEDITED};

    let mask = match sys::membarrier(QUERY) {
        Ok(mask) => mask,
        Err(err) => {
            tracing::debug!(%err, "membarrier unavailable; using page-protection fence");
            return (false, false);
        }
    };
    let global = mask & GLOBAL != 0;
    let local = match sys::membarrier(REGISTER_PRIVATE_EXPEDITED) {
        Ok(_) => true,
        Err(err) => {
            tracing::debug!(%err, "membarrier private expedited registration failed");
            false
        }
    };
    (local, global)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn probe_membarrier() -> (bool, bool) {
    (false, false)
}

/// Returns the process fence capabilities, detecting them on first call.
///
/// Concurrent first callers block until the single detection completes and
/// all observe the same result.
pub fn capability() -> &'static FenceCapability {
    CAPABILITY.get_or_init(FenceCapability::detect)
}

/// Full fence observed by every thread of the process, not just the caller.
///
/// May block on the slow path; do not call from signal handlers.
pub fn process_fence() {
    capability().fence();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn detection_reports_the_selected_families() {
        let recorder = crate::testing::Recorder::default();
        let detected = recorder.capture(FenceCapability::detect);
        assert!(recorder.saw(&[
            "process fence capabilities detected",
            "backend",
            "backend_64",
            "accelerated",
        ]));
        assert_eq!(detected.is_accelerated(), capability().is_accelerated());
    }

    #[test]
    fn slow_path_runs_repeatedly() {
        let capability = capability();
        for _ in 0..16 {
            capability.slow_fence();
        }
    }

    #[test]
    fn slow_path_is_serialized_not_deadlocking() {
        let capability = capability();
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..64 {
                        capability.slow_fence();
                        process_fence();
                    }
                });
            }
        });
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn local_mode_is_only_reported_when_registered() {
        let capability = capability();
        if capability.membarrier_local() {
            // Registration is idempotent and the command must now succeed.
            assert!(sys::membarrier(sys::membarrier_cmd::PRIVATE_EXPEDITED).is_ok());
        }
        assert_eq!(
            capability.is_accelerated(),
            capability.membarrier_local() || capability.membarrier_global()
        );
    }
}

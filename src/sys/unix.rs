#![cfg(unix)]

use core::ptr::{self, NonNull};

use libc::{c_void, mmap, mprotect, MAP_ANON, MAP_FAILED, MAP_PRIVATE, PROT_NONE, PROT_READ, PROT_WRITE};

/// Page protection used by the scratch-page fence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protection {
    /// `PROT_READ | PROT_WRITE`.
    ReadWrite,
    /// `PROT_NONE`.
    NoAccess,
}

/// Size of a virtual memory page.
pub fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size).ok().filter(|&s| s > 0).unwrap_or(4096)
}

/// Maps `size` bytes of private, zeroed, read-write memory.
/// Returns `None` if the mapping failed.
pub unsafe fn allocate_region(size: usize) -> Option<NonNull<u8>> {
    let ptr = mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANON,
        -1,
        0,
    );

    if ptr == MAP_FAILED {
        None
    } else {
        NonNull::new(ptr.cast::<u8>())
    }
}

/// Changes the protection of a mapped region. Returns `false` on failure.
pub unsafe fn protect_region(ptr: NonNull<u8>, size: usize, protection: Protection) -> bool {
    let prot = match protection {
        Protection::ReadWrite => PROT_READ | PROT_WRITE,
        Protection::NoAccess => PROT_NONE,
    };
    mprotect(ptr.as_ptr().cast::<c_void>(), size, prot) == 0
}

/// `membarrier(2)` commands; values are fixed by the kernel ABI.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod membarrier_cmd {
    /// Returns the bitmask of supported commands.
    pub const QUERY: i32 = 0;
    /// Barrier on every running thread of every process.
    pub const GLOBAL: i32 = 1 << 0;
    /// Barrier on running threads of this process; needs registration.
    pub const PRIVATE_EXPEDITED: i32 = 1 << 3;
    /// Registers this process for `PRIVATE_EXPEDITED`.
    pub const REGISTER_PRIVATE_EXPEDITED: i32 = 1 << 4;
}

/// Issues `membarrier(cmd, 0)`, returning the raw result.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn membarrier(cmd: i32) -> std::io::Result<i32> {
    // SAFETY: membarrier takes two integers and touches no user memory.
    let ret = unsafe { libc::syscall(libc::SYS_membarrier, cmd, 0) };
    if ret < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        // The kernel returns a command mask or zero, both fit in an int.
        Ok(i32::try_from(ret).unwrap_or(i32::MAX))
    }
}

#![cfg(windows)]

use windows_sys::Win32::System::Threading::FlushProcessWriteBuffers;

/// Flushes the write queue of every processor running a thread of this process.
///
/// Always available since Vista; cannot fail.
#[inline]
pub fn flush_process_write_buffers() {
    // SAFETY: no arguments, no preconditions.
    unsafe { FlushProcessWriteBuffers() }
}

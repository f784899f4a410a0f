//! Best-effort real-time setup to reduce wakeup jitter

use nix::errno::Errno;
use nix::libc;
use nix::sys::mman::{mlockall, MlockAllFlags};
use tracing::{debug, warn};

/// Lock memory and switch the calling thread to `SCHED_FIFO` at `priority`.
/// Failures are logged and otherwise ignored: timing gets worse, but the
/// pattern itself is unaffected.
pub fn elevate(priority: i32) {
    match mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE) {
        Ok(()) => debug!("memory locked"),
        Err(e) => warn!("Failed to lock memory: {}", e),
    }

    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `pthread_self` is always a valid handle for the calling thread
    // and `param` outlives the call.
    let rc = unsafe { libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param) };
    if rc == 0 {
        debug!("real-time priority set to {}", priority);
    } else {
        warn!(
            "Failed to set real-time priority {}: {}",
            priority,
            Errno::from_raw(rc)
        );
    }
}

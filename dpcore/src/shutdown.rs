//! Cooperative shutdown: interrupt handling and the single release-and-exit path
//!
//! SIGINT and SIGTERM are never delivered to a handler. [`Shutdown::on_interrupt`]
//! blocks them and opens a `signalfd` for them instead, so an interrupt stays
//! pending until it is read. A blocking wait that polls the descriptor wakes
//! immediately, whether the signal arrived before or during the wait.

use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::{SfdFlags, SignalFd};
use parking_lot::{Mutex, MutexGuard};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::out::OutputDriver;

/// Cancellation token checked by the generation loop between ticks and
/// threaded into the scheduler's blocking wait.
#[derive(Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    signals: Option<Arc<Mutex<SignalFd>>>,
}

impl Shutdown {
    /// A token that is only triggered through `request`.
    pub fn new() -> Self {
        Shutdown::default()
    }

    /// A token triggered by SIGINT or SIGTERM.
    ///
    /// Both signals are blocked in the calling thread, and threads spawned
    /// afterwards inherit the mask. Call this before spawning anything.
    pub fn on_interrupt() -> nix::Result<Self> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGINT);
        mask.add(Signal::SIGTERM);
        mask.thread_block()?;
        let signals = SignalFd::with_flags(&mask, SfdFlags::SFD_NONBLOCK | SfdFlags::SFD_CLOEXEC)?;
        Ok(Shutdown {
            flag: Arc::new(AtomicBool::new(false)),
            signals: Some(Arc::new(Mutex::new(signals))),
        })
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        if let Some(mut signals) = self.signals() {
            self.drain(&mut signals);
        }
        self.flag.load(Ordering::SeqCst)
    }

    /// The interrupt descriptor, if this token watches one. It must be
    /// unlocked again before calling `is_requested`.
    pub(crate) fn signals(&self) -> Option<MutexGuard<'_, SignalFd>> {
        self.signals.as_ref().map(|s| s.lock())
    }

    fn drain(&self, signals: &mut SignalFd) {
        loop {
            match signals.read_signal() {
                Ok(Some(siginfo)) => {
                    debug!("received signal {}", siginfo.ssi_signo);
                    self.request();
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("reading pending signals failed: {}", e);
                    break;
                }
            }
        }
    }
}

/// Why generation stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stop {
    /// End of pattern in non-repeat mode
    Finished,
    Interrupted,
}

/// Release the lines and report the stop. Both ways of stopping end here.
pub fn finalize<D: OutputDriver>(driver: D, stop: Stop) {
    if stop == Stop::Interrupted {
        // Terminate any partial line on the console (e.g. a printed ^C)
        let stderr = std::io::stderr();
        let mut stderr = stderr.lock();
        let _ = writeln!(stderr);
    }
    info!("Exiting.");
    if let Err(e) = driver.release() {
        warn!("{}", e);
    }
}

//! Drift-free periodic scheduling against absolute monotonic deadlines
//!
//! A naive `sleep(period)` loop drifts by the cost of every iteration's work.
//! Here the deadline is only ever moved forward by exactly one period, in
//! integer nanoseconds, and the sleeper waits for that absolute instant.

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::time::TimeSpec;
use nix::sys::timerfd::{
    ClockId as TimerClockId, Expiration, TimerFd, TimerFlags, TimerSetTimeFlags,
};
use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};
use std::fmt;
use std::os::fd::AsFd;
use tracing::warn;

use crate::shutdown::Shutdown;

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// An instant on the monotonic clock, `nsec` always in `[0, 1e9)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    pub sec: i64,
    pub nsec: u64,
}

impl Deadline {
    pub fn new(sec: i64, nsec: u64) -> Self {
        let mut d = Deadline { sec, nsec: 0 };
        d.advance(nsec);
        d
    }

    /// Move forward by `period_ns`, carrying whole seconds one at a time.
    pub fn advance(&mut self, period_ns: u64) {
        self.nsec += period_ns;
        while self.nsec >= NANOS_PER_SEC {
            self.nsec -= NANOS_PER_SEC;
            self.sec += 1;
        }
    }

    /// Nanoseconds from `earlier` to `self`, negative if `self` is earlier.
    pub fn nanos_since(&self, earlier: &Deadline) -> i128 {
        (self.sec as i128 - earlier.sec as i128) * NANOS_PER_SEC as i128
            + (self.nsec as i128 - earlier.nsec as i128)
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

impl From<TimeSpec> for Deadline {
    fn from(ts: TimeSpec) -> Self {
        Deadline::new(ts.tv_sec() as i64, ts.tv_nsec() as u64)
    }
}

impl From<Deadline> for TimeSpec {
    fn from(d: Deadline) -> Self {
        TimeSpec::new(d.sec as _, d.nsec as _)
    }
}

/// Outcome of a blocking wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
    Deadline,
    Cancelled,
}

/// Source of monotonic time with an absolute-deadline sleep.
pub trait Clock {
    fn now(&self) -> Deadline;

    /// Block until `deadline` or until shutdown is requested.
    fn sleep_until(&mut self, deadline: &Deadline, shutdown: &Shutdown) -> Wake;
}

/// `CLOCK_MONOTONIC`, waited on through a `timerfd` armed with the absolute
/// deadline and polled together with the shutdown token's interrupt
/// descriptor.
pub struct MonotonicClock {
    timer: TimerFd,
}

impl MonotonicClock {
    pub fn new() -> nix::Result<Self> {
        let timer = TimerFd::new(TimerClockId::CLOCK_MONOTONIC, TimerFlags::TFD_CLOEXEC)?;
        Ok(MonotonicClock { timer })
    }

    fn wait(&self, deadline: &Deadline, shutdown: &Shutdown) -> nix::Result<Wake> {
        self.timer.set(
            Expiration::OneShot(TimeSpec::from(*deadline)),
            TimerSetTimeFlags::TFD_TIMER_ABSTIME,
        )?;
        loop {
            if shutdown.is_requested() {
                self.timer.unset()?;
                return Ok(Wake::Cancelled);
            }
            let expired = {
                let signals = shutdown.signals();
                let timer = PollFd::new(self.timer.as_fd(), PollFlags::POLLIN);
                match &signals {
                    Some(sfd) => {
                        let mut fds = [timer, PollFd::new(sfd.as_fd(), PollFlags::POLLIN)];
                        poll_readable(&mut fds)?
                    }
                    None => poll_readable(&mut [timer])?,
                }
            };
            // An interrupt that raced the expiry still wins
            if expired && !shutdown.is_requested() {
                self.timer.wait()?;
                return Ok(Wake::Deadline);
            }
        }
    }
}

/// Block until any descriptor is ready; whether the first one is readable.
fn poll_readable(fds: &mut [PollFd<'_>]) -> nix::Result<bool> {
    match poll(fds, PollTimeout::NONE) {
        Ok(_) => {}
        Err(Errno::EINTR) => return Ok(false),
        Err(e) => return Err(e),
    }
    Ok(fds[0]
        .revents()
        .map_or(false, |r| r.contains(PollFlags::POLLIN)))
}

impl Clock for MonotonicClock {
    fn now(&self) -> Deadline {
        match clock_gettime(ClockId::CLOCK_MONOTONIC) {
            Ok(ts) => ts.into(),
            // CLOCK_MONOTONIC is mandatory on Linux
            Err(e) => panic!("monotonic clock unavailable: {}", e),
        }
    }

    fn sleep_until(&mut self, deadline: &Deadline, shutdown: &Shutdown) -> Wake {
        match self.wait(deadline, shutdown) {
            Ok(wake) => wake,
            Err(e) => {
                warn!("waiting for {} failed, falling back to a plain sleep: {}", deadline, e);
                sleep_absolute(deadline)
            }
        }
    }
}

fn sleep_absolute(deadline: &Deadline) -> Wake {
    let ts = TimeSpec::from(*deadline);
    loop {
        match clock_nanosleep(ClockId::CLOCK_MONOTONIC, ClockNanosleepFlags::TIMER_ABSTIME, &ts) {
            Ok(_) => return Wake::Deadline,
            // The request is absolute, so reissuing it loses nothing
            Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!("sleeping until {} failed: {}", deadline, e);
                return Wake::Deadline;
            }
        }
    }
}

/// The generation loop's deadline and the clock it waits on.
pub struct Scheduler<C: Clock> {
    clock: C,
    deadline: Deadline,
}

impl<C: Clock> Scheduler<C> {
    /// Start from the clock's current reading.
    pub fn start(clock: C) -> Self {
        let deadline = clock.now();
        Scheduler { clock, deadline }
    }

    pub fn advance(&mut self, period_ns: u64) {
        self.deadline.advance(period_ns);
    }

    pub fn sleep_until_deadline(&mut self, shutdown: &Shutdown) -> Wake {
        self.clock.sleep_until(&self.deadline, shutdown)
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    pub fn now(&self) -> Deadline {
        self.clock.now()
    }
}

//! In-process stand-ins for hardware and time, for exercising the generator
//! without pins or real waits.
//!
//! A [`RecordingDriver`] and a [`StepClock`] share one [`Trace`], so the
//! relative order of writes and scheduler activity can be checked.

use std::cell::RefCell;
use std::rc::Rc;

use crate::out::{DriverError, OutputDriver};
use crate::sched::{Clock, Deadline, Wake};
use crate::shutdown::Shutdown;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The clock was asked to sleep until this deadline
    Sleep(Deadline),
    Output(bool),
    /// Clock line toggled, carrying the new level
    Toggle(bool),
    Release,
}

/// Shared, ordered log of steps
#[derive(Clone, Debug, Default)]
pub struct Trace(Rc<RefCell<Vec<Step>>>);

impl Trace {
    pub fn new() -> Self {
        Trace::default()
    }

    pub fn push(&self, step: Step) {
        self.0.borrow_mut().push(step);
    }

    pub fn steps(&self) -> Vec<Step> {
        self.0.borrow().clone()
    }

    /// Output levels in the order they were written
    pub fn outputs(&self) -> Vec<bool> {
        self.0
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Step::Output(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, f: impl Fn(&Step) -> bool) -> usize {
        self.0.borrow().iter().filter(|s| f(s)).count()
    }
}

/// Driver that records every call and can inject failures
pub struct RecordingDriver {
    trace: Trace,
    clock: Option<bool>,
    fail_outputs: bool,
    fail_release: bool,
    stop_after: Option<(usize, Shutdown)>,
    writes: usize,
}

impl RecordingDriver {
    pub fn new(trace: Trace, has_clock: bool) -> Self {
        RecordingDriver {
            trace,
            clock: has_clock.then_some(false),
            fail_outputs: false,
            fail_release: false,
            stop_after: None,
            writes: 0,
        }
    }

    /// Report every output write as failed (it is still recorded).
    pub fn failing_outputs(mut self) -> Self {
        self.fail_outputs = true;
        self
    }

    pub fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Request shutdown right after the `n`th output write.
    pub fn stop_after(mut self, n: usize, shutdown: Shutdown) -> Self {
        self.stop_after = Some((n, shutdown));
        self
    }
}

impl OutputDriver for RecordingDriver {
    fn set_output_level(&mut self, level: bool) -> Result<(), DriverError> {
        self.trace.push(Step::Output(level));
        self.writes += 1;
        if let Some((n, shutdown)) = &self.stop_after {
            if self.writes >= *n {
                shutdown.request();
            }
        }
        if self.fail_outputs {
            return Err(DriverError::Output(String::from("injected failure")));
        }
        Ok(())
    }

    fn toggle_clock_level(&mut self) -> Result<(), DriverError> {
        let level = self.clock.as_mut().ok_or(DriverError::NoClock)?;
        *level = !*level;
        self.trace.push(Step::Toggle(*level));
        Ok(())
    }

    fn has_clock(&self) -> bool {
        self.clock.is_some()
    }

    fn release(self) -> Result<(), DriverError> {
        self.trace.push(Step::Release);
        if self.fail_release {
            return Err(DriverError::Release {
                line: "output",
                reason: String::from("injected failure"),
            });
        }
        Ok(())
    }
}

/// Clock that jumps straight to each requested deadline
pub struct StepClock {
    trace: Trace,
    now: Deadline,
}

impl StepClock {
    pub fn new(trace: Trace, start: Deadline) -> Self {
        StepClock {
            trace,
            now: start,
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Deadline {
        self.now
    }

    fn sleep_until(&mut self, deadline: &Deadline, shutdown: &Shutdown) -> Wake {
        if shutdown.is_requested() {
            return Wake::Cancelled;
        }
        self.trace.push(Step::Sleep(*deadline));
        if *deadline > self.now {
            self.now = *deadline;
        }
        Wake::Deadline
    }
}

//! The generation loop: one bit per period, with clock marking and logging

use tracing::{debug, warn};

use crate::cfg::Config;
use crate::out::OutputDriver;
use crate::pat::Pattern;
use crate::sched::{Clock, Scheduler, Wake};
use crate::shutdown::{Shutdown, Stop};

/// Periods shorter than this (10 Hz) are too fast to log every tick
pub const LOG_PERIOD_NS: u64 = 100_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Still generating; the index of the next bit
    Running(usize),
    Finished,
    Interrupted,
}

pub struct Generator<'a, D: OutputDriver, C: Clock> {
    pattern: &'a Pattern,
    cfg: &'a Config,
    driver: D,
    sched: Scheduler<C>,
    index: usize,
    cycles: u64,
    ticks: u64,
    rate_warned: bool,
}

impl<'a, D: OutputDriver, C: Clock> Generator<'a, D, C> {
    pub fn new(pattern: &'a Pattern, cfg: &'a Config, driver: D, sched: Scheduler<C>) -> Self {
        Generator {
            pattern,
            cfg,
            driver,
            sched,
            index: 0,
            cycles: 0,
            ticks: 0,
            rate_warned: false,
        }
    }

    /// Emit one bit, then wait out its period.
    pub fn step(&mut self, shutdown: &Shutdown) -> State {
        if shutdown.is_requested() {
            return State::Interrupted;
        }

        let bit = self.pattern.at(self.index);
        if let Err(e) = self.driver.set_output_level(bit) {
            warn!("{}", e);
        }

        // The clock edge marks the start of a cycle. It follows the data write
        // so the data edge itself carries no extra simultaneous toggle.
        if self.index == 0 && self.cfg.clock.is_some() && self.driver.has_clock() {
            if let Err(e) = self.driver.toggle_clock_level() {
                warn!("{}", e);
            }
        }

        if self.cfg.debug {
            if self.loggable() {
                debug!("{} value {}", self.sched.now(), bit as u8);
            } else {
                self.warn_rate_once();
            }
        }

        self.index += 1;
        self.ticks += 1;

        self.sched.advance(self.cfg.period_ns);
        if self.sched.sleep_until_deadline(shutdown) == Wake::Cancelled {
            return State::Interrupted;
        }

        if self.index >= self.pattern.len() {
            self.cycles += 1;
            if !self.cfg.repeat {
                return State::Finished;
            }
            self.index = 0;
            if self.cfg.debug && self.loggable() {
                debug!("repeating pattern");
            }
        }
        State::Running(self.index)
    }

    /// Step until the pattern finishes or shutdown is requested.
    pub fn run(&mut self, shutdown: &Shutdown) -> Stop {
        loop {
            match self.step(shutdown) {
                State::Running(_) => {}
                State::Finished => return Stop::Finished,
                State::Interrupted => return Stop::Interrupted,
            }
        }
    }

    fn loggable(&self) -> bool {
        self.cfg.period_ns >= LOG_PERIOD_NS
    }

    fn warn_rate_once(&mut self) {
        if !self.rate_warned {
            warn!("Frequency above 10 [Hz], values will not be logged.");
            self.rate_warned = true;
        }
    }

    /// Index of the next bit to emit
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of completed passes over the whole pattern
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Number of bits emitted
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.sched
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}

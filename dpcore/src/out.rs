//! Output drivers: the data line and the optional synchronization clock line

use embedded_hal::digital::{OutputPin, PinState};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("setting output value failed: {0}")]
    Output(String),
    #[error("toggling synchronization clock failed: {0}")]
    Clock(String),
    #[error("no synchronization clock line is configured")]
    NoClock,
    #[error("releasing {line} line failed: {reason}")]
    Release { line: &'static str, reason: String },
}

/// Capability to drive the output line and toggle the clock line.
///
/// Both writes are expected to be fast and non-blocking. A failed write is
/// reported to the caller, which decides whether it matters.
pub trait OutputDriver {
    fn set_output_level(&mut self, level: bool) -> Result<(), DriverError>;

    /// Invert the clock line. Only called when `has_clock()` is true.
    fn toggle_clock_level(&mut self) -> Result<(), DriverError>;

    fn has_clock(&self) -> bool;

    /// Give the lines back. Consuming `self` makes a second release impossible.
    fn release(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// Driver over `embedded-hal` output pins
pub struct PinDriver<P: OutputPin> {
    output: P,
    clock: Option<(P, bool)>,
}

impl<P: OutputPin> PinDriver<P> {
    /// The clock pin, if any, is assumed to start low.
    pub fn new(output: P, clock: Option<P>) -> Self {
        PinDriver {
            output,
            clock: clock.map(|c| (c, false)),
        }
    }

    /// Current level of the clock line as last written.
    pub fn clock_level(&self) -> Option<bool> {
        self.clock.as_ref().map(|&(_, level)| level)
    }

    pub fn into_pins(self) -> (P, Option<P>) {
        (self.output, self.clock.map(|(c, _)| c))
    }
}

impl<P: OutputPin> OutputDriver for PinDriver<P> {
    fn set_output_level(&mut self, level: bool) -> Result<(), DriverError> {
        self.output
            .set_state(PinState::from(level))
            .map_err(|e| DriverError::Output(format!("{:?}", e)))
    }

    fn toggle_clock_level(&mut self) -> Result<(), DriverError> {
        let (pin, level) = self.clock.as_mut().ok_or(DriverError::NoClock)?;
        // The tracked level flips even if the write fails, so the next
        // toggle still alternates.
        *level = !*level;
        pin.set_state(PinState::from(*level))
            .map_err(|e| DriverError::Clock(format!("{:?}", e)))
    }

    fn has_clock(&self) -> bool {
        self.clock.is_some()
    }

    fn release(self) -> Result<(), DriverError> {
        // Pins release their lines on drop
        drop(self);
        Ok(())
    }
}

/// Simulated driver that logs level changes instead of touching hardware
pub struct SimDriver {
    output: u32,
    clock: Option<(u32, bool)>,
}

impl SimDriver {
    pub fn new(output: u32, clock: Option<u32>) -> Self {
        SimDriver {
            output,
            clock: clock.map(|c| (c, false)),
        }
    }
}

impl OutputDriver for SimDriver {
    fn set_output_level(&mut self, level: bool) -> Result<(), DriverError> {
        debug!("line {} <- {}", self.output, level as u8);
        Ok(())
    }

    fn toggle_clock_level(&mut self) -> Result<(), DriverError> {
        let (line, level) = self.clock.as_mut().ok_or(DriverError::NoClock)?;
        *level = !*level;
        debug!("line {} <- {} (clock)", line, *level as u8);
        Ok(())
    }

    fn has_clock(&self) -> bool {
        self.clock.is_some()
    }

    fn release(self) -> Result<(), DriverError> {
        info!("simulated lines released");
        Ok(())
    }
}

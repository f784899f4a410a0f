//! GPIO lines through the Linux GPIO character device

use anyhow::{Context, Result};
use dpcore::cfg::Config;
use dpcore::out::PinDriver;
use embedded_hal::digital::PinState;
use gpiocdev_embedded_hal::OutputPin;

pub type GpioDriver = PinDriver<OutputPin>;

/// Claim the output line and, if configured, the clock line. Both start low.
pub fn open(cfg: &Config) -> Result<GpioDriver> {
    let output = OutputPin::new(&cfg.chip, cfg.output, PinState::Low).with_context(|| {
        format!(
            "initializing output line {} on {} failed",
            cfg.output,
            cfg.chip.display()
        )
    })?;
    let clock = match cfg.clock {
        Some(line) => Some(OutputPin::new(&cfg.chip, line, PinState::Low).with_context(|| {
            format!(
                "initializing synchronization clock line {} on {} failed",
                line,
                cfg.chip.display()
            )
        })?),
        None => None,
    };
    Ok(PinDriver::new(output, clock))
}

//! Configuration: run declarations and the validated generator configuration
//!
//! Settings come in layers. Command-line options and an optional JSON run
//! declaration both produce a [`Settings`]; the upper layer is merged over
//! the lower one and the result is resolved into a [`Config`], which is the
//! only form the generator ever sees.
//!
//! ## Run declaration
//!
//! Every field is optional. `period` is a human-readable duration as in
//! [humantime](https://docs.rs/humantime/), e.g. `"10ms"` or `"1s 500ms"`.
//!
//! ```json
//! {
//!     "pattern": "/usr/share/dpgen/pattern/square.txt",
//!     "period": "100ms",
//!     "repeat": true,
//!     "output": 2,
//!     "clock": 3
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PERIOD_NS: u64 = 1_000_000_000;
pub const DEFAULT_OUTPUT: u32 = 2;
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Shortest period the GPIO is expected to keep up with (230 Hz)
pub const MIN_GPIO_PERIOD_NS: u64 = 1_000_000_000 / 230;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("frequency and period are mutually exclusive")]
    TimingConflict,
    #[error("frequency must be positive and finite, got {0}")]
    InvalidFrequency(f64),
    #[error("frequency {0} Hz is too high to express as a period in nanoseconds")]
    FrequencyTooHigh(f64),
    #[error("period cannot be zero")]
    ZeroPeriod,
    #[error("period {0:?} is too long")]
    PeriodTooLong(Duration),
    #[error("output and clock lines cannot be equal (both {0})")]
    SameLine(u32),
    #[error("no pattern file given")]
    MissingPattern,
}

/// One layer of user-provided settings, e.g. the command line or a run file.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub pattern:   Option<PathBuf>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub period:    Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    pub repeat:    Option<bool>,
    pub debug:     Option<bool>,
    pub chip:      Option<PathBuf>,
    pub output:    Option<u32>,
    pub clock:     Option<u32>,
}

impl Settings {
    /// Overlay `self` on `lower`. Fields set in `self` win. Timing is taken
    /// as a unit: if `self` sets a period or a frequency, neither of the
    /// lower layer's timing fields survives.
    pub fn merge(self, lower: Settings) -> Settings {
        let (period, frequency) = if self.period.is_some() || self.frequency.is_some() {
            (self.period, self.frequency)
        } else {
            (lower.period, lower.frequency)
        };
        Settings {
            pattern: self.pattern.or(lower.pattern),
            period,
            frequency,
            repeat: self.repeat.or(lower.repeat),
            debug: self.debug.or(lower.debug),
            chip: self.chip.or(lower.chip),
            output: self.output.or(lower.output),
            clock: self.clock.or(lower.clock),
        }
    }

    /// Check invariants and fill in defaults.
    pub fn resolve(self) -> Result<Config, ConfigError> {
        let period_ns = match (self.period, self.frequency) {
            (Some(_), Some(_)) => return Err(ConfigError::TimingConflict),
            (Some(p), None) => {
                if p.is_zero() {
                    return Err(ConfigError::ZeroPeriod);
                }
                u64::try_from(p.as_nanos())
                    .ok()
                    .filter(|&ns| ns <= i64::MAX as u64)
                    .ok_or(ConfigError::PeriodTooLong(p))?
            }
            (None, Some(f)) => period_from_frequency(f)?,
            (None, None) => DEFAULT_PERIOD_NS,
        };
        let output = self.output.unwrap_or(DEFAULT_OUTPUT);
        if self.clock == Some(output) {
            return Err(ConfigError::SameLine(output));
        }
        Ok(Config {
            period_ns,
            repeat: self.repeat.unwrap_or(false),
            debug: self.debug.unwrap_or(false),
            chip: self.chip.unwrap_or_else(|| PathBuf::from(DEFAULT_CHIP)),
            output,
            clock: self.clock,
            pattern: self.pattern.ok_or(ConfigError::MissingPattern)?,
        })
    }
}

/// `round(1e9 / f)` nanoseconds
pub fn period_from_frequency(f: f64) -> Result<u64, ConfigError> {
    if !f.is_finite() || f <= 0.0 {
        return Err(ConfigError::InvalidFrequency(f));
    }
    let ns = (1e9 / f).round();
    if ns < 1.0 {
        return Err(ConfigError::FrequencyTooHigh(f));
    }
    if ns > i64::MAX as f64 {
        return Err(ConfigError::PeriodTooLong(Duration::from_secs_f64(ns / 1e9)));
    }
    Ok(ns as u64)
}

/// Validated generator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Time between bits in nanoseconds, > 0
    pub period_ns: u64,
    pub repeat:    bool,
    pub debug:     bool,
    /// GPIO character device holding both lines
    pub chip:      PathBuf,
    pub output:    u32,
    /// Synchronization clock line, never equal to `output`
    pub clock:     Option<u32>,
    pub pattern:   PathBuf,
}

impl Config {
    pub fn exceeds_gpio_rate(&self) -> bool {
        self.period_ns < MIN_GPIO_PERIOD_NS
    }

    /// Human-readable summary, one item per line
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!("  * repeat: {}", if self.repeat { "yes" } else { "no" }),
            format!("  * period: {} [ns]", self.period_ns),
            format!("  * chip: {}", self.chip.display()),
            format!("  * output line: {}", self.output),
            match self.clock {
                Some(c) => format!("  * clock line: {}", c),
                None => String::from("  * clock line: none"),
            },
            format!("  * file name: {}", self.pattern.display()),
        ]
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            period_ns: DEFAULT_PERIOD_NS,
            repeat:    false,
            debug:     false,
            chip:      PathBuf::from(DEFAULT_CHIP),
            output:    DEFAULT_OUTPUT,
            clock:     None,
            pattern:   PathBuf::new(),
        }
    }
}

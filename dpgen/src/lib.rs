use anyhow::{Context, Result};
use argh::FromArgs;
use dpcore::cfg::Settings;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

pub mod gpio;
pub mod rt;

#[derive(Debug, FromArgs, Clone)]
/// Generate a pattern defined in FILE with a GPIO line. FILE holds a
/// sequence of ones and zeros; all other characters are ignored and lines
/// starting with '#' are comments. Example patterns are located at
/// '/usr/share/dpgen/pattern'.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// frequency of the pattern in Hz (default 1, exclusive with -t)
    #[argh(option, short = 'f')]
    pub frequency: Option<f64>,
    /// period of the pattern in ns (default 1 s, exclusive with -f)
    #[argh(option, short = 't')]
    pub period: Option<u64>,
    /// repeat the pattern indefinitely instead of sending it once
    #[argh(switch, short = 'r')]
    pub repeat: bool,
    /// output line offset (default 2)
    #[argh(option, short = 'o')]
    pub output: Option<u32>,
    /// synchronization clock line offset (disabled if not given)
    #[argh(option, short = 's')]
    pub clock: Option<u32>,
    /// print debug information
    #[argh(switch, short = 'd')]
    pub debug: bool,
    /// GPIO character device (default /dev/gpiochip0)
    #[argh(option)]
    pub chip: Option<String>,
    /// run declaration file (JSON); command-line options take precedence
    #[argh(option, short = 'c')]
    pub config: Option<String>,
    /// log level changes instead of driving the GPIO lines
    #[argh(switch)]
    pub dry_run: bool,
    /// real-time scheduling priority, 0 to skip real-time setup
    #[argh(option, default = "30")]
    pub priority: i32,
    /// pattern file
    #[argh(positional)]
    pub file: Option<String>,
}

impl CliArgs {
    /// The settings given explicitly on the command line
    pub fn settings(&self) -> Settings {
        Settings {
            pattern: self.file.as_ref().map(PathBuf::from),
            period: self.period.map(Duration::from_nanos),
            frequency: self.frequency,
            repeat: self.repeat.then_some(true),
            debug: self.debug.then_some(true),
            chip: self.chip.as_ref().map(PathBuf::from),
            output: self.output,
            clock: self.clock,
        }
    }
}

/// Command-line settings over those of the run declaration, if any
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let cli = args.settings();
    match &args.config {
        Some(c) => {
            let f = File::open(c).with_context(|| format!("could not open run file '{}'", c))?;
            let rdr = BufReader::new(f);
            let file: Settings = serde_json::from_reader(rdr)
                .with_context(|| format!("could not parse run file '{}'", c))?;
            Ok(cli.merge(file))
        }
        None => Ok(cli),
    }
}

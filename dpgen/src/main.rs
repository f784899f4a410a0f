use anyhow::{Context, Result};
use dpcore::cfg::Config;
use dpcore::gen::Generator;
use dpcore::out::{OutputDriver, SimDriver};
use dpcore::pat::Pattern;
use dpcore::sched::{MonotonicClock, Scheduler};
use dpcore::shutdown::{self, Shutdown};
use dpcore::DUMP_COLUMNS;
use std::io::Write;
use tracing::{debug, info, warn, Level};

use dpgen::{gpio, rt, CliArgs};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();

    if args.version {
        let stdout = std::io::stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    let cfg = dpgen::load_settings(&args)?.resolve()?;

    tracing_subscriber::fmt()
        .with_max_level(if cfg.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if cfg.exceeds_gpio_rate() {
        warn!("Requested rate exceeds 230 [Hz], the GPIO may not keep up.");
    }
    debug!("Using the following configuration:");
    for line in cfg.summary() {
        debug!("{}", line);
    }

    let pattern = Pattern::load(&cfg.pattern)
        .with_context(|| format!("loading pattern '{}' failed", cfg.pattern.display()))?;
    info!("Loaded {} bits from '{}'.", pattern.len(), cfg.pattern.display());
    for row in pattern.debug_dump(DUMP_COLUMNS) {
        debug!("{}", row);
    }

    // Before claiming any line, so an early Ctrl-C still releases it
    let shutdown = Shutdown::on_interrupt().context("installing interrupt handler failed")?;
    let clock = MonotonicClock::new().context("creating deadline timer failed")?;

    if args.dry_run {
        info!("Dry run, no GPIO lines are claimed.");
        let driver = SimDriver::new(cfg.output, cfg.clock);
        generate(driver, clock, &pattern, &cfg, &shutdown, args.priority);
    } else {
        info!("Using GPIO chip {}.", cfg.chip.display());
        let driver = gpio::open(&cfg)?;
        generate(driver, clock, &pattern, &cfg, &shutdown, args.priority);
    }
    Ok(())
}

fn generate<D: OutputDriver>(
    driver: D,
    clock: MonotonicClock,
    pattern: &Pattern,
    cfg: &Config,
    shutdown: &Shutdown,
    priority: i32,
) {
    if priority > 0 {
        rt::elevate(priority);
    }
    info!("Press Ctrl-C to exit.");
    let mut gen = Generator::new(pattern, cfg, driver, Scheduler::start(clock));
    let stop = gen.run(shutdown);
    debug!("{} bits emitted, {} full cycles", gen.ticks(), gen.cycles());
    shutdown::finalize(gen.into_driver(), stop);
}

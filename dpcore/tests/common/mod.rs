#![allow(dead_code)]

use dpcore::cfg::Config;
use dpcore::gen::Generator;
use dpcore::pat::Pattern;
use dpcore::sched::{Deadline, Scheduler};
use dpcore::sim::{RecordingDriver, StepClock, Trace};
use std::env;
use std::path;

pub const START: Deadline = Deadline { sec: 100, nsec: 250_000_000 };

pub fn resource(name: &str) -> path::PathBuf {
    let project_root = env::var("CARGO_MANIFEST_DIR").unwrap();
    path::PathBuf::from(project_root)
        .join("tests/resources")
        .join(name)
}

pub fn sample(name: &str) -> path::PathBuf {
    let project_root = env::var("CARGO_MANIFEST_DIR").unwrap();
    path::PathBuf::from(project_root)
        .join("../patterns")
        .join(name)
}

pub fn config(period_ns: u64, repeat: bool, clock: Option<u32>) -> Config {
    Config {
        period_ns,
        repeat,
        clock,
        ..Default::default()
    }
}

/// A generator over simulated hardware and time, sharing one trace
pub fn generator<'a>(
    pattern: &'a Pattern,
    cfg: &'a Config,
    driver: RecordingDriver,
    trace: &Trace,
) -> Generator<'a, RecordingDriver, StepClock> {
    let sched = Scheduler::start(StepClock::new(trace.clone(), START));
    Generator::new(pattern, cfg, driver, sched)
}

use dpcore::cfg::{period_from_frequency, Config, ConfigError, Settings, DEFAULT_CHIP};
use std::path::PathBuf;
use std::time::Duration;

fn with_pattern() -> Settings {
    Settings {
        pattern: Some(PathBuf::from("p.txt")),
        ..Default::default()
    }
}

#[test]
fn defaults() {
    let cfg = with_pattern().resolve().unwrap();
    assert_eq!(
        cfg,
        Config {
            period_ns: 1_000_000_000,
            repeat: false,
            debug: false,
            chip: PathBuf::from(DEFAULT_CHIP),
            output: 2,
            clock: None,
            pattern: PathBuf::from("p.txt"),
        }
    );
    assert!(!cfg.exceeds_gpio_rate());
}

#[test]
fn frequency_rounds_to_nearest_nanosecond() {
    assert_eq!(period_from_frequency(1.0), Ok(1_000_000_000));
    assert_eq!(period_from_frequency(3.0), Ok(333_333_333));
    assert_eq!(period_from_frequency(7.0), Ok(142_857_143));
    assert_eq!(period_from_frequency(1e9), Ok(1));
}

#[test]
fn bad_frequencies() {
    assert_eq!(period_from_frequency(0.0), Err(ConfigError::InvalidFrequency(0.0)));
    assert_eq!(period_from_frequency(-5.0), Err(ConfigError::InvalidFrequency(-5.0)));
    assert!(matches!(period_from_frequency(f64::NAN), Err(ConfigError::InvalidFrequency(_))));
    assert_eq!(period_from_frequency(3e9), Err(ConfigError::FrequencyTooHigh(3e9)));
}

#[test]
fn period_and_frequency_conflict() {
    let s = Settings {
        period: Some(Duration::from_millis(10)),
        frequency: Some(100.0),
        ..with_pattern()
    };
    assert_eq!(s.resolve(), Err(ConfigError::TimingConflict));
}

#[test]
fn zero_period_rejected() {
    let s = Settings {
        period: Some(Duration::ZERO),
        ..with_pattern()
    };
    assert_eq!(s.resolve(), Err(ConfigError::ZeroPeriod));
}

#[test]
fn clock_must_differ_from_output() {
    let s = Settings {
        output: Some(4),
        clock: Some(4),
        ..with_pattern()
    };
    assert_eq!(s.resolve(), Err(ConfigError::SameLine(4)));

    let s = Settings {
        clock: Some(2),
        ..with_pattern()
    };
    assert_eq!(s.resolve(), Err(ConfigError::SameLine(2)));
}

#[test]
fn pattern_required() {
    assert_eq!(Settings::default().resolve(), Err(ConfigError::MissingPattern));
}

#[test]
fn fast_period_flagged() {
    let s = Settings {
        frequency: Some(1000.0),
        ..with_pattern()
    };
    let cfg = s.resolve().unwrap();
    assert_eq!(cfg.period_ns, 1_000_000);
    assert!(cfg.exceeds_gpio_rate());
}

#[test]
fn upper_layer_wins() {
    let file = Settings {
        pattern: Some(PathBuf::from("file.txt")),
        repeat: Some(true),
        output: Some(5),
        clock: Some(6),
        ..Default::default()
    };
    let cli = Settings {
        pattern: Some(PathBuf::from("cli.txt")),
        output: Some(7),
        ..Default::default()
    };
    let cfg = cli.merge(file).resolve().unwrap();
    assert_eq!(cfg.pattern, PathBuf::from("cli.txt"));
    assert_eq!(cfg.output, 7);
    assert_eq!(cfg.clock, Some(6));
    assert!(cfg.repeat);
}

#[test]
fn timing_is_replaced_as_a_unit() {
    let file = Settings {
        frequency: Some(50.0),
        ..with_pattern()
    };
    let cli = Settings {
        period: Some(Duration::from_millis(5)),
        ..Default::default()
    };
    let cfg = cli.merge(file.clone()).resolve().unwrap();
    assert_eq!(cfg.period_ns, 5_000_000);

    let cfg = Settings::default().merge(file).resolve().unwrap();
    assert_eq!(cfg.period_ns, 20_000_000);
}

#[test]
fn de_run_declaration() {
    let x = r#"{
            "pattern": "/usr/share/dpgen/pattern/prbs7.txt",
            "period": "1s 500ms",
            "repeat": true,
            "clock": 3
        }"#;
    let de: Settings = serde_json::from_str(x).unwrap();
    let s = Settings {
        pattern: Some(PathBuf::from("/usr/share/dpgen/pattern/prbs7.txt")),
        period: Some(Duration::from_millis(1500)),
        repeat: Some(true),
        clock: Some(3),
        ..Default::default()
    };
    assert_eq!(de, s);
    assert_eq!(de.resolve().unwrap().period_ns, 1_500_000_000);
}

#[test]
fn de_rejects_unknown_fields() {
    let x = r#"{ "pattern": "a.txt", "speed": 10 }"#;
    assert!(serde_json::from_str::<Settings>(x).is_err());
}

#[test]
fn summary_lists_every_setting() {
    let cfg = Settings {
        clock: Some(3),
        ..with_pattern()
    }
    .resolve()
    .unwrap();
    let summary = cfg.summary();
    assert_eq!(summary.len(), 6);
    assert_eq!(summary[1], "  * period: 1000000000 [ns]");
    assert_eq!(summary[4], "  * clock line: 3");
}

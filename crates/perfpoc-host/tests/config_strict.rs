#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use perfpoc_host::config::{self, SpeedModeName};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
emitters:
  average_duration:
    max_operaton_ms: 300 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.category.name, "PerformanceCounterPoc");
    assert!(cfg.category.verify_counters);
    assert_eq!(cfg.counters.state_file.as_deref(), Some("perfpoc-counters.json"));
    assert_eq!(cfg.emitters.instantaneous.tick_ms, 200);
    assert_eq!(cfg.emitters.average_duration.max_operation_ms, 450);
    assert_eq!(cfg.emitters.average_duration.max_delay_ms, 50);
    assert_eq!(
        (cfg.emitters.rate_per_second.slow, cfg.emitters.rate_per_second.medium, cfg.emitters.rate_per_second.fast),
        (5, 15, 40)
    );
    assert!(cfg.ops.listen.is_none());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
category:
  name: "PerfCounterPocCustomCounters"
  verify_counters: false
counters:
  state_file: null
emitters:
  instantaneous: { tick_ms: 50 }
  rate_per_second: { fixed_mode: medium, medium: 20 }
  average_duration: { enabled: false }
monitor:
  log_interval_ms: 0
ops:
  listen: "127.0.0.1:9464"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.category.name, "PerfCounterPocCustomCounters");
    assert!(!cfg.category.verify_counters);
    assert!(cfg.counters.state_file.is_none());
    assert_eq!(cfg.emitters.rate_per_second.fixed_mode, Some(SpeedModeName::Medium));
    assert_eq!(cfg.emitters.rate_per_second.medium, 20);
    assert!(!cfg.emitters.average_duration.enabled);
    assert_eq!(cfg.ops.listen.as_deref(), Some("127.0.0.1:9464"));
}

#[test]
fn rejects_wrong_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn rejects_out_of_range_values() {
    for bad in [
        "version: 1\nemitters:\n  instantaneous: { tick_ms: 1 }\n",
        "version: 1\nemitters:\n  rate_per_second: { fast: 0 }\n",
        "version: 1\nmonitor:\n  log_interval_ms: 5\n",
        "version: 1\nops:\n  listen: \"not-an-addr\"\n",
        "version: 1\ncategory:\n  name: \"\"\n",
        "version: 1\nemitters:\n  instantaneous: { enabled: false }\n  average_duration: { enabled: false }\n  rate_per_second: { enabled: false }\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.code().as_str(), "BAD_CONFIG", "{bad}");
    }
}

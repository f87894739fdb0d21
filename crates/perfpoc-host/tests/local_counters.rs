#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::PathBuf;

use perfpoc_core::{MetricCategory, MetricDescriptor, MetricKind};
use perfpoc_host::counters::{CounterSubsystem, LocalCounters};

fn temp_state_file(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("perfpoc-{tag}-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn category(name: &str) -> MetricCategory {
    MetricCategory::new(
        name,
        "demo",
        vec![
            MetricDescriptor::new("Avg", MetricKind::AverageDuration).with_help("some help"),
            MetricDescriptor::new("AvgBase", MetricKind::AverageBase),
            MetricDescriptor::new("Ops", MetricKind::RatePerSecond),
        ],
    )
}

#[test]
fn handle_operations() {
    let counters = LocalCounters::in_memory();
    counters.create_category(&category("c")).unwrap();

    let ops = counters.open_counter("c", "Ops").unwrap();
    assert_eq!(ops.name(), "Ops");
    assert_eq!(ops.kind(), MetricKind::RatePerSecond);
    assert_eq!(ops.increment(), 1);
    assert_eq!(ops.increment_by(9), 10);
    ops.set_raw(3);

    // a second handle sees the same live counter
    let again = counters.open_counter("c", "Ops").unwrap();
    assert_eq!(again.raw(), 3);
    assert_eq!(counters.sample("c").unwrap()[2].raw, 3);
}

#[test]
fn missing_category_and_counter_errors() {
    let counters = LocalCounters::in_memory();
    assert!(!counters.category_exists("c"));
    assert_eq!(counters.open_counter("c", "Ops").unwrap_err().code().as_str(), "CATEGORY_NOT_FOUND");

    counters.create_category(&category("c")).unwrap();
    assert!(counters.counter_exists("c", "Avg"));
    assert!(!counters.counter_exists("c", "Nope"));
    assert_eq!(counters.open_counter("c", "Nope").unwrap_err().code().as_str(), "COUNTER_NOT_FOUND");
    assert_eq!(counters.create_category(&category("c")).unwrap_err().code().as_str(), "CATEGORY_EXISTS");

    counters.delete_category("c").unwrap();
    counters.delete_category("c").unwrap();
    assert!(!counters.category_exists("c"));
}

#[test]
fn invalid_layout_is_refused() {
    let counters = LocalCounters::in_memory();
    let bad = MetricCategory::new("c", "demo", vec![MetricDescriptor::new("AvgBase", MetricKind::AverageBase)]);
    assert_eq!(counters.create_category(&bad).unwrap_err().code().as_str(), "INVALID_CATEGORY");
    assert!(!counters.category_exists("c"));
}

#[test]
fn definitions_survive_reopen_values_do_not() {
    let path = temp_state_file("reopen");
    {
        let counters = LocalCounters::open(&path).unwrap();
        counters.create_category(&category("c")).unwrap();
        counters.open_counter("c", "Ops").unwrap().increment_by(5);
    }

    let reopened = LocalCounters::open(&path).unwrap();
    assert!(reopened.category_exists("c"));
    assert_eq!(reopened.counter_kind("c", "AvgBase"), Some(MetricKind::AverageBase));
    assert_eq!(reopened.open_counter("c", "Ops").unwrap().raw(), 0);

    reopened.delete_category("c").unwrap();
    let after_delete = LocalCounters::open(&path).unwrap();
    assert!(!after_delete.category_exists("c"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn corrupt_state_file_is_an_error() {
    let path = temp_state_file("corrupt");
    std::fs::write(&path, "not json").unwrap();
    let err = LocalCounters::open(&path).err().expect("must fail");
    assert_eq!(err.code().as_str(), "IO");
    let _ = std::fs::remove_file(&path);
}

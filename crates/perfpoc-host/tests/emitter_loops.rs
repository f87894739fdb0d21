//! Emitter update policies and cancellation, on a paused clock.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use perfpoc_core::MetricKind;
use perfpoc_host::cancel::CancelSource;
use perfpoc_host::counters::{CounterSubsystem, LocalCounters};
use perfpoc_host::emitters::{
    scheduled_mode, sine_value, AverageDurationEmitter, EmitterTarget, InstantaneousEmitter, MetricEmitter,
    RatePerSecondEmitter, SpeedMode, SpeedModes,
};
use perfpoc_host::registry::MetricRegistry;

const CATEGORY: &str = "EmitterTests";

fn provisioned(emitters: &[Arc<dyn MetricEmitter>], counters: &Arc<LocalCounters>) {
    let dyn_counters: Arc<dyn CounterSubsystem> = counters.clone();
    let registry = MetricRegistry::new(dyn_counters, CATEGORY, "tests");
    registry.provision(&MetricRegistry::declare_all(emitters).unwrap()).unwrap();
}

fn target(counters: &Arc<LocalCounters>) -> EmitterTarget {
    let dyn_counters: Arc<dyn CounterSubsystem> = counters.clone();
    EmitterTarget::new(CATEGORY, dyn_counters)
}

fn raw(counters: &LocalCounters, counter: &str) -> i64 {
    counters
        .sample(CATEGORY)
        .unwrap()
        .into_iter()
        .find(|s| s.name == counter)
        .unwrap()
        .raw
}

fn all_emitters(t: &EmitterTarget) -> Vec<Arc<dyn MetricEmitter>> {
    vec![
        Arc::new(InstantaneousEmitter::new(t.clone(), Duration::from_millis(200))),
        Arc::new(AverageDurationEmitter::new(t.clone(), Duration::from_millis(450), Duration::from_millis(50)).with_seed(1)),
        Arc::new(RatePerSecondEmitter::new(t.clone(), SpeedModes::default()).with_fixed_mode(SpeedMode::Fast)),
    ]
}

#[test]
fn describe_is_stable() {
    let counters = Arc::new(LocalCounters::in_memory());
    for e in all_emitters(&target(&counters)) {
        let first = e.describe();
        assert!(!first.is_empty(), "{}", e.name());
        for _ in 0..3 {
            assert_eq!(e.describe(), first, "{}", e.name());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_prompt_and_final() {
    let counters = Arc::new(LocalCounters::in_memory());
    let emitters = all_emitters(&target(&counters));
    provisioned(&emitters, &counters);

    for e in emitters {
        let cancel = CancelSource::new();
        let signal = cancel.signal();
        let running = Arc::clone(&e);
        let handle = tokio::spawn(async move { running.run(signal).await });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .unwrap_or_else(|_| panic!("{} did not stop within one tick", e.name()))
            .unwrap()
            .unwrap();

        let before = counters.sample(CATEGORY).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counters.sample(CATEGORY).unwrap(), before, "{} wrote after cancel", e.name());
    }
}

#[tokio::test(start_paused = true)]
async fn unprovisioned_category_fails_run() {
    let counters = Arc::new(LocalCounters::in_memory());
    let e = InstantaneousEmitter::new(target(&counters), Duration::from_millis(200));
    let err = e.run(CancelSource::new().signal()).await.expect_err("must fail");
    assert_eq!(err.code().as_str(), "CATEGORY_NOT_FOUND");
}

#[tokio::test(start_paused = true)]
async fn instantaneous_overwrites_with_bounded_values() {
    let counters = Arc::new(LocalCounters::in_memory());
    let e: Arc<dyn MetricEmitter> = Arc::new(InstantaneousEmitter::new(target(&counters), Duration::from_millis(200)));
    provisioned(std::slice::from_ref(&e), &counters);

    let cancel = CancelSource::new();
    let signal = cancel.signal();
    let running = Arc::clone(&e);
    let handle = tokio::spawn(async move { running.run(signal).await });

    let mut seen = Vec::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        seen.push(raw(&counters, InstantaneousEmitter::COUNTER));
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();

    assert!(seen.iter().all(|v| (0..=100).contains(v)));
    // 20s of a ~63s period climbs from 50 towards the peak
    assert!(seen.last().copied().unwrap() > 90);
}

#[test]
fn sine_value_shape() {
    assert_eq!(sine_value(Duration::ZERO), 50);
    assert!(sine_value(Duration::from_millis(15_708)) >= 99);
    assert!(sine_value(Duration::from_millis(47_124)) <= 1);
}

#[tokio::test(start_paused = true)]
async fn average_pair_counts_each_completed_operation() {
    const SEED: u64 = 7;
    let counters = Arc::new(LocalCounters::in_memory());
    let e: Arc<dyn MetricEmitter> = Arc::new(
        AverageDurationEmitter::new(target(&counters), Duration::from_millis(450), Duration::from_millis(50))
            .with_seed(SEED),
    );
    provisioned(std::slice::from_ref(&e), &counters);

    let cancel = CancelSource::new();
    let signal = cancel.signal();
    let running = Arc::clone(&e);
    let handle = tokio::spawn(async move { running.run(signal).await });

    let (mut last_total, mut last_count) = (0, 0);
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let total = raw(&counters, AverageDurationEmitter::COUNTER);
        let count = raw(&counters, AverageDurationEmitter::BASE_COUNTER);
        assert!(total >= last_total && count >= last_count);
        (last_total, last_count) = (total, count);
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();

    // replay the emitter's draws: operation duration, then the gap
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut expected_micros = 0i64;
    for _ in 0..last_count {
        expected_micros += rng.random_range(0..450u64) as i64 * 1000;
        let _gap = rng.random_range(0..50u64);
    }

    assert!(last_count >= 10, "5s should complete at least 10 operations, got {last_count}");
    let slack = last_count * 1000;
    assert!(
        (last_total - expected_micros).abs() <= slack,
        "accumulator {last_total}us does not match {last_count} operations ({expected_micros}us)"
    );
}

#[tokio::test(start_paused = true)]
async fn rate_tracks_the_active_mode() {
    let counters = Arc::new(LocalCounters::in_memory());
    let e: Arc<dyn MetricEmitter> = Arc::new(
        RatePerSecondEmitter::new(target(&counters), SpeedModes::default()).with_fixed_mode(SpeedMode::Medium),
    );
    provisioned(std::slice::from_ref(&e), &counters);
    assert_eq!(e.describe()[0].kind, MetricKind::RatePerSecond);

    let cancel = CancelSource::new();
    let signal = cancel.signal();
    let running = Arc::clone(&e);
    let handle = tokio::spawn(async move { running.run(signal).await });

    let mut last = 0;
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let now = raw(&counters, RatePerSecondEmitter::COUNTER);
        assert!(now >= last);
        last = now;
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();

    // 15 ops/s nominal over 10s
    assert!((135..=165).contains(&last), "got {last} operations in 10s");
}

#[test]
fn clock_schedule() {
    assert_eq!(scheduled_mode(0), SpeedMode::Fast);
    assert_eq!(scheduled_mode(21), SpeedMode::Fast);
    assert_eq!(scheduled_mode(22), SpeedMode::Slow);
    assert_eq!(scheduled_mode(41), SpeedMode::Slow);
    assert_eq!(scheduled_mode(42), SpeedMode::Medium);
    assert_eq!(scheduled_mode(59), SpeedMode::Medium);

    let modes = SpeedModes::default();
    assert_eq!(modes.ops_per_second(SpeedMode::Slow), 5);
    assert_eq!(modes.ops_per_second(SpeedMode::Fast), 40);
}

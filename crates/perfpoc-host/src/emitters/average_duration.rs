use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use perfpoc_core::error::Result;
use perfpoc_core::{MetricDescriptor, MetricKind};

use super::{EmitterTarget, MetricEmitter};
use crate::cancel::CancelSignal;
use crate::counters::CounterHandle;

/// Simulates operations of random duration and records each one in the
/// accumulator/base pair. The reader computes the average.
pub struct AverageDurationEmitter {
    target: EmitterTarget,
    max_operation: Duration,
    max_delay: Duration,
    seed: Option<u64>,
}

/// Live counters owned by one running emitter.
struct AveragePair {
    total: CounterHandle,
    base: CounterHandle,
}

impl AveragePair {
    /// Accumulator first, then base, so a reader never sees a count without its time.
    fn record(&self, took: Duration) {
        let micros = i64::try_from(took.as_micros()).unwrap_or(i64::MAX);
        self.total.increment_by(micros);
        self.base.increment();
    }
}

impl AverageDurationEmitter {
    pub const COUNTER: &'static str = "AverageOperationDuration";
    pub const BASE_COUNTER: &'static str = "AverageOperationDurationBase";

    pub fn new(target: EmitterTarget, max_operation: Duration, max_delay: Duration) -> Self {
        Self {
            target,
            max_operation,
            max_delay,
            seed: None,
        }
    }

    /// Deterministic durations, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn random_below(rng: &mut StdRng, max: Duration) -> Duration {
        let max_ms = max.as_millis().max(1) as u64;
        Duration::from_millis(rng.random_range(0..max_ms))
    }
}

#[async_trait]
impl MetricEmitter for AverageDurationEmitter {
    fn name(&self) -> &'static str {
        "average_duration"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        vec![
            MetricDescriptor::new(Self::COUNTER, MetricKind::AverageDuration)
                .with_help("Average duration of simulated operations since the last sample."),
            MetricDescriptor::new(Self::BASE_COUNTER, MetricKind::AverageBase)
                .with_help("Completed operations, base for AverageOperationDuration."),
        ]
    }

    async fn run(&self, cancel: CancelSignal) -> Result<()> {
        let pair = AveragePair {
            total: self.target.open(Self::COUNTER)?,
            base: self.target.open(Self::BASE_COUNTER)?,
        };
        pair.total.set_raw(0);
        pair.base.set_raw(0);

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        tracing::info!(emitter = self.name(), category = %self.target.category(), "emitter started");

        while !cancel.is_cancelled() {
            let op = Self::random_below(&mut rng, self.max_operation);
            let started = Instant::now();
            if !cancel.sleep(op).await {
                break;
            }
            pair.record(started.elapsed());

            let gap = Self::random_below(&mut rng, self.max_delay);
            if !cancel.sleep(gap).await {
                break;
            }
        }

        tracing::info!(emitter = self.name(), "emitter exiting");
        Ok(())
    }
}

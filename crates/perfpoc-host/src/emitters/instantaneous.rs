use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use perfpoc_core::error::Result;
use perfpoc_core::{MetricDescriptor, MetricKind};

use super::{EmitterTarget, MetricEmitter};
use crate::cancel::CancelSignal;

/// Writes a slow sine wave in `0..=100` (one period is about 63s).
pub struct InstantaneousEmitter {
    target: EmitterTarget,
    tick: Duration,
}

impl InstantaneousEmitter {
    pub const COUNTER: &'static str = "AlwaysHasAValue";

    pub fn new(target: EmitterTarget, tick: Duration) -> Self {
        Self { target, tick }
    }
}

/// Value written after `elapsed` time since the emitter started.
pub fn sine_value(elapsed: Duration) -> i64 {
    let ms = elapsed.as_secs_f64() * 1000.0;
    (((ms * 0.0001).sin() + 1.0) * 50.0) as i64
}

#[async_trait]
impl MetricEmitter for InstantaneousEmitter {
    fn name(&self) -> &'static str {
        "instantaneous"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        vec![MetricDescriptor::new(Self::COUNTER, MetricKind::InstantaneousValue)]
    }

    async fn run(&self, cancel: CancelSignal) -> Result<()> {
        let counter = self.target.open(Self::COUNTER)?;
        let started = Instant::now();
        tracing::info!(emitter = self.name(), category = %self.target.category(), "emitter started");

        while !cancel.is_cancelled() {
            if !cancel.sleep(self.tick).await {
                break;
            }
            counter.set_raw(sine_value(started.elapsed()));
        }

        tracing::info!(emitter = self.name(), "emitter exiting");
        Ok(())
    }
}

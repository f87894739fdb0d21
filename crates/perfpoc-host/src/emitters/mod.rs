//! Metric emitters: one background loop per metric-producing component.
//!
//! Every emitter describes the counters it owns and writes them until the
//! shared cancellation signal fires. Update policies:
//! - [`InstantaneousEmitter`]: overwrite on a fixed tick
//! - [`AverageDurationEmitter`]: accumulator + base pair per simulated operation
//! - [`RatePerSecondEmitter`]: monotonic increment per completed operation

mod average_duration;
mod instantaneous;
mod rate_per_second;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use perfpoc_core::error::Result;
use perfpoc_core::MetricDescriptor;

use crate::cancel::CancelSignal;
use crate::config::{EmittersSection, SpeedModeName};
use crate::counters::{CounterHandle, CounterSubsystem};

pub use average_duration::AverageDurationEmitter;
pub use instantaneous::{sine_value, InstantaneousEmitter};
pub use rate_per_second::{scheduled_mode, RatePerSecondEmitter, SpeedMode, SpeedModes};

#[async_trait]
pub trait MetricEmitter: Send + Sync {
    /// Stable emitter name (logs, error reports).
    fn name(&self) -> &'static str;

    /// Counters this emitter writes. Same list on every call.
    fn describe(&self) -> Vec<MetricDescriptor>;

    /// Write counters until `cancel` fires. Cancellation returns `Ok(())`.
    async fn run(&self, cancel: CancelSignal) -> Result<()>;
}

/// Where an emitter writes: the category name plus the counter subsystem.
#[derive(Clone)]
pub struct EmitterTarget {
    category: Arc<str>,
    counters: Arc<dyn CounterSubsystem>,
}

impl EmitterTarget {
    pub fn new(category: impl Into<Arc<str>>, counters: Arc<dyn CounterSubsystem>) -> Self {
        Self {
            category: category.into(),
            counters,
        }
    }

    pub fn category(&self) -> &str { &self.category }

    pub(crate) fn open(&self, counter: &str) -> Result<CounterHandle> {
        self.counters.open_counter(&self.category, counter)
    }
}

/// Build the enabled emitters, in declaration order.
pub fn build_from_config(cfg: &EmittersSection, target: &EmitterTarget) -> Vec<Arc<dyn MetricEmitter>> {
    let mut out: Vec<Arc<dyn MetricEmitter>> = Vec::new();

    if cfg.instantaneous.enabled {
        out.push(Arc::new(InstantaneousEmitter::new(
            target.clone(),
            Duration::from_millis(cfg.instantaneous.tick_ms),
        )));
    }

    if cfg.average_duration.enabled {
        out.push(Arc::new(AverageDurationEmitter::new(
            target.clone(),
            Duration::from_millis(cfg.average_duration.max_operation_ms),
            Duration::from_millis(cfg.average_duration.max_delay_ms),
        )));
    }

    if cfg.rate_per_second.enabled {
        let r = &cfg.rate_per_second;
        let mut e = RatePerSecondEmitter::new(
            target.clone(),
            SpeedModes {
                slow: r.slow,
                medium: r.medium,
                fast: r.fast,
            },
        );
        if let Some(fixed) = r.fixed_mode {
            e = e.with_fixed_mode(match fixed {
                SpeedModeName::Slow => SpeedMode::Slow,
                SpeedModeName::Medium => SpeedMode::Medium,
                SpeedModeName::Fast => SpeedMode::Fast,
            });
        }
        out.push(Arc::new(e));
    }

    out
}

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use perfpoc_core::error::Result;
use perfpoc_core::{MetricDescriptor, MetricKind};

use super::{EmitterTarget, MetricEmitter};
use crate::cancel::CancelSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    Slow,
    Medium,
    Fast,
}

impl SpeedMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SpeedMode::Slow => "slow",
            SpeedMode::Medium => "medium",
            SpeedMode::Fast => "fast",
        }
    }
}

/// Operations per second for each mode.
#[derive(Debug, Clone, Copy)]
pub struct SpeedModes {
    pub slow: u32,
    pub medium: u32,
    pub fast: u32,
}

impl Default for SpeedModes {
    fn default() -> Self {
        Self {
            slow: 5,
            medium: 15,
            fast: 40,
        }
    }
}

impl SpeedModes {
    pub fn ops_per_second(&self, mode: SpeedMode) -> u32 {
        let ops = match mode {
            SpeedMode::Slow => self.slow,
            SpeedMode::Medium => self.medium,
            SpeedMode::Fast => self.fast,
        };
        ops.max(1)
    }
}

/// Clock schedule: seconds 0-21 fast, 22-41 slow, 42-59 medium.
pub fn scheduled_mode(second_of_minute: u64) -> SpeedMode {
    match second_of_minute / 2 {
        0..=10 => SpeedMode::Fast,
        11..=20 => SpeedMode::Slow,
        _ => SpeedMode::Medium,
    }
}

/// Performs operations at a mode-dependent pace, one increment per operation.
/// Rate per second is left to the reader.
pub struct RatePerSecondEmitter {
    target: EmitterTarget,
    modes: SpeedModes,
    fixed: Option<SpeedMode>,
}

impl RatePerSecondEmitter {
    pub const COUNTER: &'static str = "OperationsPerSecond";

    pub fn new(target: EmitterTarget, modes: SpeedModes) -> Self {
        Self {
            target,
            modes,
            fixed: None,
        }
    }

    pub fn with_fixed_mode(mut self, mode: SpeedMode) -> Self {
        self.fixed = Some(mode);
        self
    }

    pub fn current_mode(&self) -> SpeedMode {
        if let Some(mode) = self.fixed {
            return mode;
        }
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        scheduled_mode(secs % 60)
    }
}

#[async_trait]
impl MetricEmitter for RatePerSecondEmitter {
    fn name(&self) -> &'static str {
        "rate_per_second"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        vec![MetricDescriptor::new(Self::COUNTER, MetricKind::RatePerSecond)
            .with_help("Simulated operations completed per second.")]
    }

    async fn run(&self, cancel: CancelSignal) -> Result<()> {
        let counter = self.target.open(Self::COUNTER)?;
        counter.set_raw(0);
        tracing::info!(emitter = self.name(), category = %self.target.category(), "emitter started");

        let mut last_mode = None;
        'outer: while !cancel.is_cancelled() {
            let mode = self.current_mode();
            if last_mode != Some(mode) {
                tracing::debug!(emitter = self.name(), mode = mode.as_str(), "speed mode");
                last_mode = Some(mode);
            }

            // one second's worth of operations at this speed
            let ops = self.modes.ops_per_second(mode);
            let per_op = Duration::from_millis(u64::from((1000 / ops).max(1)));
            for _ in 0..ops {
                if !cancel.sleep(per_op).await {
                    break 'outer;
                }
                counter.increment();
            }
        }

        tracing::info!(emitter = self.name(), "emitter exiting");
        Ok(())
    }
}

//! Reader side: samples a category and derives the displayed values, the way
//! an external monitoring tool would.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use perfpoc_core::error::{PerfError, Result};
use perfpoc_core::sample::derive;
use perfpoc_core::{CounterSample, DerivedValue};

use crate::cancel::CancelSignal;
use crate::counters::CounterSubsystem;

struct LastSample {
    at: Instant,
    values: Vec<CounterSample>,
}

pub struct Monitor {
    counters: Arc<dyn CounterSubsystem>,
    category: String,
    last: Mutex<LastSample>,
}

impl Monitor {
    /// The first poll derives against all-zero counters at construction time.
    pub fn new(counters: Arc<dyn CounterSubsystem>, category: impl Into<String>) -> Self {
        Self {
            counters,
            category: category.into(),
            last: Mutex::new(LastSample {
                at: Instant::now(),
                values: Vec::new(),
            }),
        }
    }

    /// Values since the previous poll.
    pub fn poll(&self) -> Result<Vec<DerivedValue>> {
        let values = self.counters.sample(&self.category)?;
        let now = Instant::now();

        let mut last = self
            .last
            .lock()
            .map_err(|_| PerfError::Internal("monitor lock poisoned".into()))?;
        let derived = derive(&last.values, &values, now.saturating_duration_since(last.at));
        *last = LastSample { at: now, values };
        Ok(derived)
    }

    /// Log derived values every `interval` until cancelled.
    pub async fn log_until(self: Arc<Self>, interval: Duration, cancel: CancelSignal) {
        while cancel.sleep(interval).await {
            match self.poll() {
                Ok(values) => {
                    for v in values {
                        tracing::info!(
                            category = %self.category,
                            counter = %v.name,
                            kind = v.kind.as_str(),
                            value = %format!("{:.2}", v.value),
                            "sample"
                        );
                    }
                }
                Err(e) => tracing::warn!(category = %self.category, error = %e, "sample failed"),
            }
        }
    }
}

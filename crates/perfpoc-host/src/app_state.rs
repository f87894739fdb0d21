//! Shared state for the ops HTTP surface.
//!
//! Read-only view of the host: the counter subsystem, the category being
//! emitted, the host state and a monitor for derived values.

use std::sync::Arc;

use tokio::sync::watch;

use perfpoc_core::error::{PerfError, Result};
use perfpoc_core::CounterSample;

use crate::counters::CounterSubsystem;
use crate::monitor::Monitor;
use crate::runner::HostState;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    counters: Arc<dyn CounterSubsystem>,
    category: String,
    host_state: watch::Receiver<HostState>,
    monitor: Monitor,
}

impl AppState {
    pub fn new(
        counters: Arc<dyn CounterSubsystem>,
        category: impl Into<String>,
        host_state: watch::Receiver<HostState>,
    ) -> Self {
        let category = category.into();
        let monitor = Monitor::new(Arc::clone(&counters), category.clone());
        Self {
            inner: Arc::new(AppStateInner {
                counters,
                category,
                host_state,
                monitor,
            }),
        }
    }

    pub fn category(&self) -> &str {
        &self.inner.category
    }

    pub fn host_state(&self) -> HostState {
        *self.inner.host_state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.host_state() == HostState::Running
    }

    /// Raw values; empty while the category is not provisioned.
    pub fn sample(&self) -> Vec<CounterSample> {
        match self.inner.counters.sample(&self.inner.category) {
            Ok(values) => values,
            Err(PerfError::CategoryNotFound(_)) => Vec::new(),
            Err(e) => {
                tracing::warn!(category = %self.inner.category, code = e.code().as_str(), error = %e, "sample failed");
                Vec::new()
            }
        }
    }

    pub fn derived(&self) -> Result<Vec<perfpoc_core::DerivedValue>> {
        self.inner.monitor.poll()
    }
}

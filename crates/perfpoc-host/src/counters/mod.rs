//! Counter subsystem seam.
//!
//! Emitters and the registry only see [`CounterSubsystem`]; the host ships
//! [`LocalCounters`], an in-process implementation whose category definitions
//! can survive restarts through a state file.

mod local;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use perfpoc_core::error::Result;
use perfpoc_core::{CounterSample, MetricCategory, MetricKind};

pub use local::LocalCounters;

/// Operations consumed from the counter subsystem.
pub trait CounterSubsystem: Send + Sync {
    fn category_exists(&self, category: &str) -> bool;
    fn counter_exists(&self, category: &str, counter: &str) -> bool;
    /// Live kind of a counter, `None` when category or counter is missing.
    fn counter_kind(&self, category: &str, counter: &str) -> Option<MetricKind>;
    /// Fails if the category already exists or its layout is invalid.
    fn create_category(&self, category: &MetricCategory) -> Result<()>;
    /// Deleting a missing category is not an error.
    fn delete_category(&self, category: &str) -> Result<()>;
    fn open_counter(&self, category: &str, counter: &str) -> Result<CounterHandle>;
    /// Raw values of every counter, in category order.
    fn sample(&self, category: &str) -> Result<Vec<CounterSample>>;
}

/// Writable handle to one live counter.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    name: Arc<str>,
    kind: MetricKind,
    cell: Arc<AtomicI64>,
}

impl CounterHandle {
    pub(crate) fn new(name: impl Into<Arc<str>>, kind: MetricKind, cell: Arc<AtomicI64>) -> Self {
        Self {
            name: name.into(),
            kind,
            cell,
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn kind(&self) -> MetricKind { self.kind }

    /// Overwrite the value (last write wins).
    pub fn set_raw(&self, v: i64) {
        self.cell.store(v, Ordering::Release);
    }

    /// Add `delta` and return the new value.
    pub fn increment_by(&self, delta: i64) -> i64 {
        self.cell.fetch_add(delta, Ordering::AcqRel) + delta
    }

    pub fn increment(&self) -> i64 {
        self.increment_by(1)
    }

    pub fn raw(&self) -> i64 {
        self.cell.load(Ordering::Acquire)
    }
}

//! Metric registry: declares what the emitters write and provisions it.
//!
//! Provisioning is destructive: an existing category with the same name is
//! deleted and recreated from the declared descriptors, which resets every
//! counter value. A mismatch is never repaired in place.

use std::collections::HashSet;
use std::sync::Arc;

use perfpoc_core::error::{PerfError, Result};
use perfpoc_core::{MetricCategory, MetricDescriptor};

use crate::counters::CounterSubsystem;
use crate::emitters::MetricEmitter;

pub struct MetricRegistry {
    counters: Arc<dyn CounterSubsystem>,
    category: String,
    description: String,
    verify_counters: bool,
}

impl MetricRegistry {
    pub fn new(
        counters: Arc<dyn CounterSubsystem>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            counters,
            category: category.into(),
            description: description.into(),
            verify_counters: true,
        }
    }

    /// With `false`, [`Self::verify`] only checks that the category exists.
    pub fn verify_counters(mut self, on: bool) -> Self {
        self.verify_counters = on;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Descriptors of all emitters, in emitter order. Counter names must be unique.
    pub fn declare_all(emitters: &[Arc<dyn MetricEmitter>]) -> Result<Vec<MetricDescriptor>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for e in emitters {
            for d in e.describe() {
                if !seen.insert(d.name.clone()) {
                    return Err(PerfError::DuplicateMetric(format!("{} (emitter {})", d.name, e.name())));
                }
                out.push(d);
            }
        }
        Ok(out)
    }

    /// Explain why the live category does not match `descriptors`.
    pub fn verify(&self, descriptors: &[MetricDescriptor]) -> Result<()> {
        if !self.counters.category_exists(&self.category) {
            return Err(PerfError::ProvisioningMismatch(format!(
                "category {} does not exist",
                self.category
            )));
        }
        if !self.verify_counters {
            return Ok(());
        }
        for d in descriptors {
            match self.counters.counter_kind(&self.category, &d.name) {
                None => {
                    return Err(PerfError::ProvisioningMismatch(format!("counter {} is missing", d.name)));
                }
                Some(live) if live != d.kind => {
                    return Err(PerfError::ProvisioningMismatch(format!(
                        "counter {} is {} but {} is declared",
                        d.name,
                        live.as_str(),
                        d.kind.as_str()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn is_provisioned(&self, descriptors: &[MetricDescriptor]) -> bool {
        match self.verify(descriptors) {
            Ok(()) => true,
            Err(e) => {
                tracing::info!(category = %self.category, reason = %e, "category not provisioned");
                false
            }
        }
    }

    /// Delete any existing category and recreate it with exactly `descriptors`.
    pub fn provision(&self, descriptors: &[MetricDescriptor]) -> Result<()> {
        let def = MetricCategory::new(self.category.clone(), self.description.clone(), descriptors.to_vec());
        def.validate()?;

        if self.counters.category_exists(&self.category) {
            tracing::info!(category = %self.category, "deleting counter category");
            self.counters.delete_category(&self.category)?;
        }

        tracing::info!(category = %self.category, counters = descriptors.len(), "creating counter category");
        self.counters.create_category(&def)
    }
}

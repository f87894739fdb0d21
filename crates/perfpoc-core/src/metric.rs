//! Metric descriptors and category definitions.
//!
//! Layout rules (checked by [`MetricCategory::validate`]):
//! - counter names are non-empty and unique within a category
//! - an `AverageDuration` counter is immediately followed by its `AverageBase`
//! - an `AverageBase` counter only appears right after an `AverageDuration`

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PerfError, Result};

/// How a counter's raw value is interpreted by the monitoring side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Reports whatever value was last written.
    InstantaneousValue,
    /// Accumulated operation time (microseconds), averaged against its base.
    AverageDuration,
    /// Completed-operation count paired with an `AverageDuration` counter.
    AverageBase,
    /// Monotonic count, turned into operations/second by the reader.
    RatePerSecond,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::InstantaneousValue => "instantaneous_value",
            MetricKind::AverageDuration => "average_duration",
            MetricKind::AverageBase => "average_base",
            MetricKind::RatePerSecond => "rate_per_second",
        }
    }

    /// Whether the raw value only ever grows while an emitter writes it.
    pub fn is_cumulative(self) -> bool {
        !matches!(self, MetricKind::InstantaneousValue)
    }
}

/// Immutable declaration of one counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl MetricDescriptor {
    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Named group of counters, provisioned together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCategory {
    pub name: String,
    pub description: String,
    #[serde(default = "default_single_instance")]
    pub single_instance: bool,
    pub descriptors: Vec<MetricDescriptor>,
}

fn default_single_instance() -> bool {
    true
}

impl MetricCategory {
    /// Single-instance category holding `descriptors` in the given order.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        descriptors: Vec<MetricDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            single_instance: true,
            descriptors,
        }
    }

    pub fn descriptor(&self, counter: &str) -> Option<&MetricDescriptor> {
        self.descriptors.iter().find(|d| d.name == counter)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PerfError::InvalidCategory("category name must not be empty".into()));
        }
        if self.descriptors.is_empty() {
            return Err(PerfError::InvalidCategory(format!(
                "category {} declares no counters",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for d in &self.descriptors {
            if d.name.trim().is_empty() {
                return Err(PerfError::InvalidCategory(format!(
                    "category {} has a counter with an empty name",
                    self.name
                )));
            }
            if !seen.insert(d.name.as_str()) {
                return Err(PerfError::InvalidCategory(format!(
                    "category {} declares counter {} twice",
                    self.name, d.name
                )));
            }
        }

        for (i, d) in self.descriptors.iter().enumerate() {
            match d.kind {
                MetricKind::AverageDuration => {
                    let next = self.descriptors.get(i + 1).map(|n| n.kind);
                    if next != Some(MetricKind::AverageBase) {
                        return Err(PerfError::InvalidCategory(format!(
                            "{} must be immediately followed by an average_base counter",
                            d.name
                        )));
                    }
                }
                MetricKind::AverageBase => {
                    let prev = i.checked_sub(1).and_then(|p| self.descriptors.get(p));
                    if prev.map(|p| p.kind) != Some(MetricKind::AverageDuration) {
                        return Err(PerfError::InvalidCategory(format!(
                            "{} must immediately follow an average_duration counter",
                            d.name
                        )));
                    }
                }
                MetricKind::InstantaneousValue | MetricKind::RatePerSecond => {}
            }
        }
        Ok(())
    }
}

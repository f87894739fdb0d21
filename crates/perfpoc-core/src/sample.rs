//! Raw counter samples and the values a monitoring tool derives from them.
//!
//! Emitters never average or compute rates themselves; the reader takes two
//! samples of a category and derives the displayed values from the deltas:
//! - instantaneous: the current raw value
//! - average: delta(accumulator) / delta(base), microseconds -> milliseconds
//! - rate: delta(raw) / elapsed seconds
//!
//! A counter missing from the previous sample counts as 0 there. Deltas that
//! go backwards (category recreated in between) clamp to 0.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::metric::MetricKind;

/// Raw value of one counter at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSample {
    pub name: String,
    pub kind: MetricKind,
    pub raw: i64,
}

/// Value as displayed by the monitoring side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedValue {
    pub name: String,
    pub kind: MetricKind,
    pub value: f64,
}

/// Derive displayed values from two samples of the same category.
///
/// `curr` must be in category order so that every `AverageDuration` entry is
/// directly followed by its base. Base counters are not reported.
pub fn derive(prev: &[CounterSample], curr: &[CounterSample], elapsed: Duration) -> Vec<DerivedValue> {
    let before: HashMap<&str, i64> = prev.iter().map(|s| (s.name.as_str(), s.raw)).collect();
    let delta = |s: &CounterSample| -> i64 {
        let old = before.get(s.name.as_str()).copied().unwrap_or(0);
        s.raw.saturating_sub(old).max(0)
    };

    let mut out = Vec::with_capacity(curr.len());
    for (i, s) in curr.iter().enumerate() {
        let value = match s.kind {
            MetricKind::InstantaneousValue => s.raw as f64,
            MetricKind::AverageDuration => {
                let Some(base) = curr.get(i + 1).filter(|b| b.kind == MetricKind::AverageBase) else {
                    tracing::debug!(counter = %s.name, "average counter without base in sample");
                    continue;
                };
                let ops = delta(base);
                if ops == 0 {
                    0.0
                } else {
                    delta(s) as f64 / ops as f64 / 1000.0
                }
            }
            MetricKind::AverageBase => continue,
            MetricKind::RatePerSecond => {
                let secs = elapsed.as_secs_f64();
                if secs <= 0.0 {
                    0.0
                } else {
                    delta(s) as f64 / secs
                }
            }
        };
        out.push(DerivedValue {
            name: s.name.clone(),
            kind: s.kind,
            value,
        });
    }
    out
}

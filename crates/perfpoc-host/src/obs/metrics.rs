//! Prometheus text exposition of raw counter values.
//!
//! Instantaneous counters render as gauges; every cumulative kind (average
//! accumulator, its base, rate) renders as a `_total` counter and the scraper
//! derives averages and rates itself. Counter names are converted from
//! CamelCase to snake_case under the `perfpoc_` prefix, with the category as
//! a label.

use std::fmt::Write;

use perfpoc_core::CounterSample;

use crate::runner::HostState;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// `AverageOperationDurationBase` -> `perfpoc_average_operation_duration_base`.
pub fn metric_name(counter: &str) -> String {
    let chars: Vec<char> = counter.chars().collect();
    let mut out = String::from("perfpoc_");
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
            let next = chars.get(i + 1).copied();
            // word boundary: "aB", or the "V" in "AValue"
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// Render one category sample plus the host state gauge.
pub fn render(category: &str, samples: &[CounterSample], state: HostState) -> String {
    let mut out = String::new();
    let label = format!("category=\"{}\"", escape_label(category));

    for s in samples {
        let (name, ty) = if s.kind.is_cumulative() {
            (format!("{}_total", metric_name(&s.name)), "counter")
        } else {
            (metric_name(&s.name), "gauge")
        };
        let _ = writeln!(out, "# TYPE {} {}", name, ty);
        let _ = writeln!(out, "{}{{{}}} {}", name, label, s.raw);
    }

    let _ = writeln!(out, "# TYPE perfpoc_host_state gauge");
    for st in [
        HostState::Idle,
        HostState::Provisioning,
        HostState::Running,
        HostState::Stopping,
        HostState::Stopped,
    ] {
        let _ = writeln!(
            out,
            "perfpoc_host_state{{state=\"{}\"}} {}",
            st.as_str(),
            if st == state { 1 } else { 0 }
        );
    }
    out
}

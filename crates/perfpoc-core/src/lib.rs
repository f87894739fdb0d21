//! perfpoc core: runtime-free metric types, error surface and sample math.
//!
//! This crate defines the descriptors, category layout rules and the
//! monitoring-side derivation shared by the host, its emitters and any
//! tooling that reads counters. It carries no runtime dependencies so it can
//! be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `PerfError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metric;
pub mod sample;

/// Shared result type.
pub use error::{ErrorCode, PerfError, Result};
pub use metric::{MetricCategory, MetricDescriptor, MetricKind};
pub use sample::{CounterSample, DerivedValue};

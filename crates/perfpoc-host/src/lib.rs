//! perfpoc host library entry.
//!
//! This crate wires the counter subsystem, metric registry, emitters and the
//! host/runner state machine into the two hosts (interactive console and
//! managed worker role), plus the read-only ops surface. It is consumed by the
//! binaries and by integration tests.

pub mod app_state;
pub mod cancel;
pub mod config;
pub mod counters;
pub mod emitters;
pub mod monitor;
pub mod obs;
pub mod ops;
pub mod registry;
pub mod router;
pub mod runner;
pub mod worker;

/// Install the fmt subscriber used by both binaries (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

//! Scrape-side rendering of the counter category.
//!
//! Values are read from the counter subsystem on demand and rendered by the
//! `/metrics` handler; nothing is cached here.

pub mod metrics;

//! Top-level facade crate for perfpoc.
//!
//! Re-exports core types and the host library so users can depend on a single crate.

pub mod core {
    pub use perfpoc_core::*;
}

pub mod host {
    pub use perfpoc_host::*;
}

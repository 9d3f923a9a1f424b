//! Credence Runtime
//!
//! Wires the registry, crawler, synthesizer and prioritizer into a single
//! per-item validation pipeline, and owns configuration and ledger
//! persistence.

pub mod config;
pub mod snapshot;
pub mod pipeline;

pub use config::*;
pub use snapshot::*;
pub use pipeline::*;

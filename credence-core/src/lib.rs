//! Credence Core - Domain reliability ledger and evidence model
//!
//! This crate provides the foundational primitives:
//! - Domain canonicalization for URLs
//! - Per-domain trust records with a bounded membership state machine
//! - The shared `DomainRegistry` and its reliability events
//! - Curated seed lists of known reliable/unreliable sources
//! - Validation evidence and conclusion types

pub mod domain;
pub mod record;
pub mod events;
pub mod registry;
pub mod seeds;
pub mod evidence;

pub use domain::*;
pub use record::*;
pub use events::*;
pub use registry::*;
pub use seeds::*;
pub use evidence::*;

/// Weight assigned to a domain seen for the first time
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Upper bound on a domain weight
pub const MAX_WEIGHT: f64 = 5.0;

/// Lower bound on a domain weight after a failure penalty (red flags drop to zero)
pub const MIN_PENALIZED_WEIGHT: f64 = 0.1;

/// Upper bound on `DomainRegistry::score`
pub const MAX_SCORE: f64 = 5.0;

/// Weight gained per success once a streak reaches `WEIGHT_GAIN_STREAK`
pub const WEIGHT_GAIN: f64 = 0.2;

/// Multiplier applied per failure once a streak reaches `WEIGHT_DECAY_STREAK`
pub const WEIGHT_DECAY: f64 = 0.7;

/// Consecutive successes before weight starts growing
pub const WEIGHT_GAIN_STREAK: u32 = 3;

/// Consecutive successes before a domain is promoted to Reliable
pub const PROMOTION_STREAK: u32 = 5;

/// Consecutive failures before weight starts decaying
pub const WEIGHT_DECAY_STREAK: u32 = 2;

/// Consecutive failures before a domain is demoted to Unreliable
pub const DEMOTION_STREAK: u32 = 3;

/// Total usage required before a failing domain can be red-flagged
pub const RED_FLAG_MIN_USAGE: u64 = 5;

/// Consecutive successes a red-flagged domain needs to recover
pub const RECOVERY_THRESHOLD: u32 = 10;

/// Weight a recovered domain restarts at
pub const PROBATION_WEIGHT: f64 = 0.5;

/// Confidence floor for synthesized conclusions
pub const MIN_CONFIDENCE: f64 = 0.1;

/// Confidence ceiling for synthesized conclusions
pub const MAX_CONFIDENCE: f64 = 1.0;

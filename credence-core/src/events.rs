//! Reliability events emitted by the registry
//!
//! Observers subscribe through `DomainRegistry::subscribe` and receive
//! events over a broadcast channel.

use serde::{Deserialize, Serialize};

/// Why a domain was red-flagged
pub const RED_FLAG_REASON: &str = "consecutive failures after sufficient usage";

/// A trust transition worth telling observers about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReliabilityEvent {
    /// A domain entered the RedFlagged state
    SourceRedFlagged {
        domain: String,
        reason: String,
        consecutive_failures: u32,
        total_usage: u64,
        success_rate: f64,
    },

    /// A red-flagged domain completed its recovery streak
    SourceRecovered {
        domain: String,
        consecutive_successes: u32,
        recovery_threshold: u32,
    },
}

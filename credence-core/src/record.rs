//! Per-domain trust records
//!
//! A `DomainRecord` is the ledger entry for one canonical domain. Records
//! are created lazily on first report (or seeded at startup) and are only
//! ever mutated through `DomainRegistry::report_outcome`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_WEIGHT;

/// Trust classification of a domain. Exactly one applies at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    #[default]
    Neutral,
    Reliable,
    Unreliable,
    /// Terminal until recovery: scores as zero and is refused by the fetch gate
    RedFlagged,
}

impl Membership {
    /// Base contribution of the membership to `DomainRegistry::score`
    pub fn base_score(&self) -> f64 {
        match self {
            Membership::Reliable => 0.8,
            Membership::Unreliable => 0.2,
            Membership::Neutral | Membership::RedFlagged => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Neutral => "neutral",
            Membership::Reliable => "reliable",
            Membership::Unreliable => "unreliable",
            Membership::RedFlagged => "red_flagged",
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correct/total outcome counters. `total >= correct` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Accuracy {
    pub correct: u64,
    pub total: u64,
}

impl Accuracy {
    pub fn new(correct: u64, total: u64) -> Self {
        Self {
            correct: correct.min(total),
            total,
        }
    }

    /// Fraction of correct outcomes, or `None` before any outcome was recorded
    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }

    pub(crate) fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.correct += 1;
        }
    }
}

/// Ledger entry for one canonical domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Outcome counters shared by the fetch and validation channels
    pub accuracy: Accuracy,

    /// Trust multiplier in `[0.0, 5.0]`
    pub weight: f64,

    /// Current success run (zero whenever `consecutive_failures > 0`)
    pub consecutive_successes: u32,

    /// Current failure run (zero whenever `consecutive_successes > 0`)
    pub consecutive_failures: u32,

    pub total_usage: u64,
    pub successful_usage: u64,

    pub last_used_at: Option<DateTime<Utc>>,

    pub membership: Membership,
}

impl DomainRecord {
    /// A record for a domain seen for the first time
    pub fn neutral() -> Self {
        Self {
            accuracy: Accuracy::default(),
            weight: DEFAULT_WEIGHT,
            consecutive_successes: 0,
            consecutive_failures: 0,
            total_usage: 0,
            successful_usage: 0,
            last_used_at: None,
            membership: Membership::Neutral,
        }
    }

    /// A pre-seeded record with a fixed usage history
    pub fn seeded(membership: Membership, weight: f64, correct: u64, total: u64) -> Self {
        Self {
            accuracy: Accuracy::new(correct, total),
            weight,
            total_usage: total,
            successful_usage: correct.min(total),
            membership,
            ..Self::neutral()
        }
    }

    pub fn is_red_flagged(&self) -> bool {
        self.membership == Membership::RedFlagged
    }

    /// Fraction of uses that succeeded, `0.0` before first use
    pub fn success_rate(&self) -> f64 {
        if self.total_usage == 0 {
            0.0
        } else {
            self.successful_usage as f64 / self.total_usage as f64
        }
    }
}

impl Default for DomainRecord {
    fn default() -> Self {
        Self::neutral()
    }
}

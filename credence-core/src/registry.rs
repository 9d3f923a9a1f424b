//! Domain Registry - the shared trust ledger
//!
//! The registry owns one `DomainRecord` per canonical domain and drives the
//! membership state machine:
//!
//! ```text
//! Neutral <-> Reliable      (5 consecutive successes / 3 consecutive failures)
//! Neutral <-> Unreliable
//! Unreliable -> RedFlagged  (3 consecutive failures with >= 5 total uses)
//! RedFlagged -> Neutral     (10 consecutive successes, weight reset to 0.5)
//! ```
//!
//! Records live in a sharded concurrent map, so a report on one domain holds
//! only that domain's entry lock while membership, weight and counters change
//! together. Reports on different domains proceed in parallel.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    canonicalize_domain, curated_records, Accuracy, DomainRecord, Membership, ReliabilityEvent,
    DEMOTION_STREAK, MAX_SCORE, MAX_WEIGHT, MIN_PENALIZED_WEIGHT, PROBATION_WEIGHT,
    PROMOTION_STREAK, RECOVERY_THRESHOLD, RED_FLAG_MIN_USAGE, RED_FLAG_REASON, WEIGHT_DECAY,
    WEIGHT_DECAY_STREAK, WEIGHT_GAIN, WEIGHT_GAIN_STREAK,
};

/// Default capacity of the event broadcast buffer
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Which kind of evidence an outcome report carries.
///
/// Both channels feed the same counters on the record: a page that fetched
/// cleanly and a claim that later validated as correct each count as one
/// correct use of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeChannel {
    /// The page behind the URL was (or was not) fetched with content
    Fetch,
    /// A conclusion built on the source was (or was not) borne out
    Validation,
}

impl std::fmt::Display for OutcomeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeChannel::Fetch => f.write_str("fetch"),
            OutcomeChannel::Validation => f.write_str("validation"),
        }
    }
}

impl DomainRecord {
    /// Reliability score in `[0.0, 5.0]`.
    ///
    /// Red-flagged records always score zero. A failure streak of two or more
    /// replaces any success bonus with a penalty.
    pub fn score(&self) -> f64 {
        if self.is_red_flagged() {
            return 0.0;
        }

        let base = self.membership.base_score();
        let total = if self.accuracy.total == 0 { 1 } else { self.accuracy.total };
        let accuracy_score = self.accuracy.correct as f64 / total as f64;

        let mut history_bonus = if self.consecutive_successes >= PROMOTION_STREAK {
            0.2
        } else if self.consecutive_successes >= WEIGHT_GAIN_STREAK {
            0.1
        } else {
            0.0
        };
        if self.consecutive_failures >= WEIGHT_DECAY_STREAK {
            history_bonus = -0.2;
        }

        ((base + accuracy_score + history_bonus) * self.weight).clamp(0.0, MAX_SCORE)
    }

    /// Apply one outcome to the record and return the event it triggers, if any.
    pub fn apply_outcome(
        &mut self,
        domain: &str,
        success: bool,
        now: DateTime<Utc>,
    ) -> Option<ReliabilityEvent> {
        self.total_usage += 1;
        self.last_used_at = Some(now);
        self.accuracy.record(success);

        let event = if success {
            self.successful_usage += 1;
            self.apply_success(domain)
        } else {
            self.apply_failure(domain)
        };

        self.weight = self.weight.clamp(0.0, MAX_WEIGHT);
        event
    }

    fn apply_success(&mut self, domain: &str) -> Option<ReliabilityEvent> {
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;

        if self.is_red_flagged() {
            // Weight stays pinned at zero until the recovery streak completes
            if self.consecutive_successes < RECOVERY_THRESHOLD {
                return None;
            }
            self.membership = Membership::Neutral;
            self.weight = PROBATION_WEIGHT;
            return Some(ReliabilityEvent::SourceRecovered {
                domain: domain.to_string(),
                consecutive_successes: self.consecutive_successes,
                recovery_threshold: RECOVERY_THRESHOLD,
            });
        }

        if self.consecutive_successes >= WEIGHT_GAIN_STREAK {
            self.weight = (self.weight + WEIGHT_GAIN).min(MAX_WEIGHT);
        }
        if self.consecutive_successes >= PROMOTION_STREAK {
            self.membership = Membership::Reliable;
        }
        None
    }

    fn apply_failure(&mut self, domain: &str) -> Option<ReliabilityEvent> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;

        if self.is_red_flagged() {
            return None;
        }

        if self.consecutive_failures >= WEIGHT_DECAY_STREAK {
            self.weight = (self.weight * WEIGHT_DECAY).max(MIN_PENALIZED_WEIGHT);
        }
        if self.consecutive_failures >= DEMOTION_STREAK {
            self.membership = Membership::Unreliable;
        }
        if self.total_usage >= RED_FLAG_MIN_USAGE && self.consecutive_failures >= DEMOTION_STREAK {
            self.membership = Membership::RedFlagged;
            self.weight = 0.0;
            return Some(ReliabilityEvent::SourceRedFlagged {
                domain: domain.to_string(),
                reason: RED_FLAG_REASON.to_string(),
                consecutive_failures: self.consecutive_failures,
                total_usage: self.total_usage,
                success_rate: self.success_rate(),
            });
        }
        None
    }
}

/// Process-wide trust ledger keyed by canonical domain
pub struct DomainRegistry {
    records: DashMap<String, DomainRecord>,
    events: broadcast::Sender<ReliabilityEvent>,
}

impl DomainRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty registry with a custom event buffer size
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            records: DashMap::new(),
            events,
        }
    }

    /// Create a registry pre-seeded with the curated source lists
    pub fn with_curated_seeds() -> Self {
        let registry = Self::new();
        registry.restore(curated_records());
        registry
    }

    /// Subscribe to red-flag and recovery events
    pub fn subscribe(&self) -> broadcast::Receiver<ReliabilityEvent> {
        self.events.subscribe()
    }

    /// Insert or replace the record for a domain
    pub fn seed(&self, url: &str, record: DomainRecord) {
        self.records.insert(canonicalize_domain(url), record);
    }

    /// Reliability score of the URL's domain in `[0.0, 5.0]`.
    ///
    /// Unknown domains score as a fresh neutral record would.
    pub fn score(&self, url: &str) -> f64 {
        let domain = canonicalize_domain(url);
        match self.records.get(&domain) {
            Some(record) => record.score(),
            None => DomainRecord::neutral().score(),
        }
    }

    /// Record a fetch outcome for the URL's domain
    pub fn report(&self, url: &str, success: bool) {
        self.report_outcome(url, OutcomeChannel::Fetch, success);
    }

    /// Record whether fetching the URL produced content
    pub fn report_fetch(&self, url: &str, success: bool) {
        self.report_outcome(url, OutcomeChannel::Fetch, success);
    }

    /// Record whether a conclusion drawn from the URL turned out accurate
    pub fn report_validation(&self, url: &str, accurate: bool) {
        self.report_outcome(url, OutcomeChannel::Validation, accurate);
    }

    /// Record an outcome on either channel and run the state machine
    pub fn report_outcome(&self, url: &str, channel: OutcomeChannel, success: bool) {
        let domain = canonicalize_domain(url);

        let (event, membership, weight) = {
            let mut record = self
                .records
                .entry(domain.clone())
                .or_insert_with(DomainRecord::neutral);
            let before = record.membership;
            let event = record.apply_outcome(&domain, success, Utc::now());
            if record.membership != before {
                info!(
                    "Domain {} moved {} -> {} on {} {}",
                    domain,
                    before,
                    record.membership,
                    channel,
                    if success { "success" } else { "failure" }
                );
            }
            (event, record.membership, record.weight)
        };

        debug!(
            "Reported {} {} for {} (membership: {}, weight: {:.2})",
            channel,
            if success { "success" } else { "failure" },
            domain,
            membership,
            weight
        );

        if let Some(event) = event {
            match &event {
                ReliabilityEvent::SourceRedFlagged {
                    consecutive_failures,
                    total_usage,
                    ..
                } => warn!(
                    "Source {} red-flagged after {} consecutive failures ({} uses)",
                    domain, consecutive_failures, total_usage
                ),
                ReliabilityEvent::SourceRecovered { .. } => {
                    info!("Source {} recovered to probation", domain)
                }
            }
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }

    /// Current weight of the URL's domain, if it has a record
    pub fn weight(&self, url: &str) -> Option<f64> {
        self.records
            .get(&canonicalize_domain(url))
            .map(|record| record.weight)
    }

    /// Accuracy counters of the URL's domain, if it has a record
    pub fn accuracy(&self, url: &str) -> Option<Accuracy> {
        self.records
            .get(&canonicalize_domain(url))
            .map(|record| record.accuracy)
    }

    /// Membership of the URL's domain; unknown domains are Neutral
    pub fn membership(&self, url: &str) -> Membership {
        self.records
            .get(&canonicalize_domain(url))
            .map(|record| record.membership)
            .unwrap_or_default()
    }

    pub fn is_red_flagged(&self, url: &str) -> bool {
        self.membership(url) == Membership::RedFlagged
    }

    /// Cloned snapshot of one record
    pub fn record(&self, url: &str) -> Option<DomainRecord> {
        self.records
            .get(&canonicalize_domain(url))
            .map(|record| record.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordered copy of every record, suitable for persistence
    pub fn snapshot(&self) -> BTreeMap<String, DomainRecord> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Merge records into the registry, replacing existing domains.
    ///
    /// Keys are re-canonicalized and weights clamped into range.
    pub fn restore(&self, records: impl IntoIterator<Item = (String, DomainRecord)>) {
        for (domain, mut record) in records {
            record.weight = record.weight.clamp(0.0, MAX_WEIGHT);
            record.accuracy = Accuracy::new(record.accuracy.correct, record.accuracy.total);
            self.records.insert(canonicalize_domain(&domain), record);
        }
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Confidence Synthesizer
//!
//! Combines how much was found (insight volume) with how far the sources
//! behind it can be trusted (registry weight and accuracy) into one scalar
//! in `[0.1, 1.0]`.

use std::sync::Arc;
use tracing::debug;

use credence_core::{
    DomainRegistry, Membership, SourceReliabilityBreakdown, ValidationSource, MAX_CONFIDENCE,
    MIN_CONFIDENCE,
};

/// Share of the final score taken by insight volume
const VOLUME_SHARE: f64 = 0.4;

/// Share of the final score taken by source trust
const SOURCE_SHARE: f64 = 0.6;

/// Volume contribution per insight, capped at `MAX_VOLUME_SCORE`
const PER_INSIGHT: f64 = 0.1;
const MAX_VOLUME_SCORE: f64 = 0.8;

/// Bonus per reliable source, capped at `MAX_RELIABLE_BONUS`
const PER_RELIABLE_BONUS: f64 = 0.05;
const MAX_RELIABLE_BONUS: f64 = 0.2;

/// Accuracy and average assumed for sources without history
const DEFAULT_ACCURACY: f64 = 0.5;
const DEFAULT_SOURCE_WEIGHT: f64 = 1.0;

pub struct ConfidenceSynthesizer {
    registry: Arc<DomainRegistry>,
}

impl ConfidenceSynthesizer {
    pub fn new(registry: Arc<DomainRegistry>) -> Self {
        Self { registry }
    }

    /// Confidence in a conclusion drawn from `insights` and backed by `sources`.
    ///
    /// Red-flagged sources are skipped entirely. Sources without a URL count
    /// as unknown domains.
    pub fn compute<T>(&self, insights: &[T], sources: &[ValidationSource]) -> f64 {
        if insights.is_empty() {
            return MIN_CONFIDENCE;
        }

        let base = (insights.len() as f64 * PER_INSIGHT).min(MAX_VOLUME_SCORE);

        let mut weighted_accuracy = 0.0;
        let mut total_weight = 0.0;
        let mut reliable_count = 0usize;

        for source in sources {
            let Some(url) = source.url.as_deref() else {
                weighted_accuracy += DEFAULT_ACCURACY * DEFAULT_SOURCE_WEIGHT;
                total_weight += DEFAULT_SOURCE_WEIGHT;
                continue;
            };

            let membership = self.registry.membership(url);
            if membership == Membership::RedFlagged {
                continue;
            }

            let weight = self.registry.weight(url).unwrap_or(DEFAULT_SOURCE_WEIGHT);
            let accuracy = self
                .registry
                .accuracy(url)
                .and_then(|a| a.ratio())
                .unwrap_or(DEFAULT_ACCURACY);

            weighted_accuracy += accuracy * weight;
            total_weight += weight;
            if membership == Membership::Reliable {
                reliable_count += 1;
            }
        }

        let avg_source_confidence = if total_weight > 0.0 {
            weighted_accuracy / total_weight
        } else {
            DEFAULT_ACCURACY
        };

        let combined = base * VOLUME_SHARE + avg_source_confidence * SOURCE_SHARE;
        let bonus = (reliable_count as f64 * PER_RELIABLE_BONUS).min(MAX_RELIABLE_BONUS);
        let confidence = (combined + bonus).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        debug!(
            "Confidence {:.3} (base {:.2}, sources {:.2}, {} reliable)",
            confidence, base, avg_source_confidence, reliable_count
        );
        confidence
    }

    /// Count sources by trust class. Red-flagged sources count as unreliable.
    pub fn breakdown(&self, sources: &[ValidationSource]) -> SourceReliabilityBreakdown {
        let mut breakdown = SourceReliabilityBreakdown {
            total: sources.len(),
            ..Default::default()
        };

        for source in sources {
            match self.registry.membership(source.locator()) {
                Membership::Reliable => breakdown.reliable += 1,
                Membership::Neutral => breakdown.neutral += 1,
                Membership::Unreliable | Membership::RedFlagged => breakdown.unreliable += 1,
            }
        }

        breakdown
    }
}

//! Validation Source Prioritizer
//!
//! Orders evidence by trust class: reliable first, then neutral, then a
//! capped number of unreliable sources. Relative input order is kept within
//! each class.

use std::sync::Arc;
use tracing::debug;

use credence_core::{DomainRegistry, Membership, ValidationSource};

/// Unreliable sources are capped at one in five of the input, rounded up
const UNRELIABLE_DIVISOR: usize = 5;

pub struct ValidationPrioritizer {
    registry: Arc<DomainRegistry>,
}

impl ValidationPrioritizer {
    pub fn new(registry: Arc<DomainRegistry>) -> Self {
        Self { registry }
    }

    /// Most unreliable sources kept out of `total` inputs: `ceil(total * 0.2)`
    pub fn max_unreliable(total: usize) -> usize {
        total.div_ceil(UNRELIABLE_DIVISOR)
    }

    /// Reorder `sources` by trust class and drop excess unreliable entries.
    ///
    /// Red-flagged sources are bucketed with the unreliable ones.
    pub fn prioritize(&self, sources: Vec<ValidationSource>) -> Vec<ValidationSource> {
        if sources.is_empty() {
            return sources;
        }

        let max_unreliable = Self::max_unreliable(sources.len());
        let mut reliable = Vec::new();
        let mut neutral = Vec::new();
        let mut unreliable = Vec::new();

        for source in sources {
            match self.registry.membership(source.locator()) {
                Membership::Reliable => reliable.push(source),
                Membership::Neutral => neutral.push(source),
                Membership::Unreliable | Membership::RedFlagged => unreliable.push(source),
            }
        }

        if unreliable.len() > max_unreliable {
            debug!(
                "Dropping {} unreliable validation sources (cap {})",
                unreliable.len() - max_unreliable,
                max_unreliable
            );
            unreliable.truncate(max_unreliable);
        }

        reliable.extend(neutral);
        reliable.extend(unreliable);
        reliable
    }
}

//! Validation Pipeline
//!
//! Runs one content item through the engine:
//! 1. Analyze the item itself
//! 2. Crawl outward from it
//! 3. Gather validation sources (the item as primary, crawled pages as peers)
//! 4. Prioritize the sources
//! 5. Synthesize confidence
//!
//! Downstream correctness is fed back with `report_validation` once known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use credence_core::{
    curated_records, ContentKind, DomainRegistry, Insight, ReliabilityEvent,
    SourceReliabilityBreakdown, ValidationSource, ValidationSourceType, MAX_SCORE,
};
use credence_engine::{
    CancelSignal, ConfidenceSynthesizer, CrawlConfig, CrawledLink, GatedFetcher, HttpFetcher,
    KeywordInsightAnalyzer, LinkCrawler, SharedAnalyzer, SharedFetcher, StopReason,
    ValidationPrioritizer,
};

use crate::{restore_snapshot, CredenceConfig, SnapshotError};

/// A piece of content to evaluate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub kind: ContentKind,
}

impl ContentItem {
    pub fn new(url: &str, content: &str, kind: ContentKind) -> Self {
        Self {
            url: url.to_string(),
            content: content.to_string(),
            kind,
        }
    }
}

/// Result of evaluating one content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conclusion {
    pub id: Uuid,
    pub subject_url: String,
    /// Confidence in `[0.1, 1.0]`
    pub confidence: f64,
    /// Trust classes of every gathered source, before prioritization
    pub breakdown: SourceReliabilityBreakdown,
    /// Insights from the item and every crawled page
    pub insights: Vec<Insight>,
    /// Prioritized validation sources the confidence was computed from
    pub sources: Vec<ValidationSource>,
    pub crawled: Vec<CrawledLink>,
    pub stop_reason: StopReason,
    pub created_at: DateTime<Utc>,
}

/// Build the shared registry described by the configuration
pub fn build_registry(config: &CredenceConfig) -> Result<Arc<DomainRegistry>, SnapshotError> {
    let registry = DomainRegistry::with_event_capacity(config.pipeline.event_capacity);

    if config.registry.seed_curated {
        registry.restore(curated_records());
    }
    if let Some(path) = &config.registry.snapshot_path {
        let restored = restore_snapshot(&registry, path)?;
        info!("Restored {} domain records from {}", restored, path.display());
    }

    Ok(Arc::new(registry))
}

/// Per-item orchestration over the shared registry
pub struct ValidationPipeline {
    registry: Arc<DomainRegistry>,
    analyzer: SharedAnalyzer,
    crawler: LinkCrawler,
    synthesizer: ConfidenceSynthesizer,
    prioritizer: ValidationPrioritizer,
}

impl ValidationPipeline {
    /// Assemble a pipeline. The fetcher is placed behind the red-flag gate.
    pub fn new(
        registry: Arc<DomainRegistry>,
        fetcher: SharedFetcher,
        analyzer: SharedAnalyzer,
        crawl_config: CrawlConfig,
    ) -> Self {
        let gated: SharedFetcher = Arc::new(GatedFetcher::new(registry.clone(), fetcher));
        Self {
            crawler: LinkCrawler::new(registry.clone(), gated, analyzer.clone(), crawl_config),
            synthesizer: ConfidenceSynthesizer::new(registry.clone()),
            prioritizer: ValidationPrioritizer::new(registry.clone()),
            analyzer,
            registry,
        }
    }

    /// Assemble a pipeline with HTTP fetching and keyword analysis
    pub fn from_config(config: &CredenceConfig) -> anyhow::Result<Self> {
        let registry = build_registry(config)?;
        let fetcher = HttpFetcher::new(config.http.clone())?;
        Ok(Self::new(
            registry,
            Arc::new(fetcher),
            Arc::new(KeywordInsightAnalyzer::new()),
            config.crawler.clone(),
        ))
    }

    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    /// Subscribe to red-flag and recovery events
    pub fn subscribe(&self) -> broadcast::Receiver<ReliabilityEvent> {
        self.registry.subscribe()
    }

    /// Evaluate one content item
    pub async fn evaluate(&self, item: &ContentItem) -> Conclusion {
        self.evaluate_with_cancel(item, &CancelSignal::never()).await
    }

    /// Evaluate one content item; the crawl stops early if `cancel` is raised
    pub async fn evaluate_with_cancel(&self, item: &ContentItem, cancel: &CancelSignal) -> Conclusion {
        let mut insights = self.analyzer.analyze(&item.content, item.kind).await;

        let cap = self.crawler.config().max_processed;
        let outcome = self.crawler.crawl(&item.content, &item.url, cap, cancel).await;
        for link in &outcome.links {
            insights.extend(link.insights.iter().cloned());
        }

        let gathered = self.gather_sources(item, &outcome.links);
        let sources = self.prioritizer.prioritize(gathered);
        let breakdown = self.synthesizer.breakdown(&sources);
        let confidence = self.synthesizer.compute(&insights, &sources);

        info!(
            "Evaluated {}: confidence {:.2} from {} insights, {} sources ({} reliable, {} unreliable)",
            item.url,
            confidence,
            insights.len(),
            sources.len(),
            breakdown.reliable,
            breakdown.unreliable
        );

        Conclusion {
            id: Uuid::new_v4(),
            subject_url: item.url.clone(),
            confidence,
            breakdown,
            insights,
            sources,
            crawled: outcome.links,
            stop_reason: outcome.stop_reason,
            created_at: Utc::now(),
        }
    }

    /// The item as primary evidence plus one peer source per crawled page
    pub fn gather_sources(&self, item: &ContentItem, crawled: &[CrawledLink]) -> Vec<ValidationSource> {
        let primary = ValidationSource::new(ValidationSourceType::Primary)
            .with_url(&item.url)
            .with_reliability(self.registry.score(&item.url) / MAX_SCORE)
            .with_data(serde_json::json!({ "kind": item.kind }));

        std::iter::once(primary)
            .chain(crawled.iter().map(|link| {
                ValidationSource::new(ValidationSourceType::Peer)
                    .with_url(&link.url)
                    .with_reliability(link.source_reliability / MAX_SCORE)
                    .with_data(serde_json::json!({ "insights": link.insights.len() }))
            }))
            .collect()
    }

    /// Feed back whether a conclusion proved accurate.
    ///
    /// Each distinct source URL receives one validation-channel report.
    pub fn report_validation(&self, conclusion: &Conclusion, accurate: bool) {
        let mut seen = HashSet::new();
        for source in &conclusion.sources {
            let Some(url) = source.url.as_deref() else {
                continue;
            };
            if seen.insert(url) {
                self.registry.report_validation(url, accurate);
            }
        }
        if !accurate {
            warn!(
                "Conclusion {} on {} marked inaccurate; {} sources penalized",
                conclusion.id,
                conclusion.subject_url,
                seen.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use credence_core::Membership;
    use credence_engine::{FetchError, PageFetcher};
    use std::collections::HashMap;

    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Network(format!("no route to {}", url)))
        }
    }

    fn pipeline(registry: Arc<DomainRegistry>) -> ValidationPipeline {
        let pages: HashMap<String, String> = [
            (
                "https://reuters.com/markets/btc",
                "Bitcoin looks bullish above the 60k support zone. Funding rates are neutral today.",
            ),
            (
                "https://100xgems.com/analysis/next",
                "This token is a guaranteed rally, target 100x by Friday for sure.",
            ),
        ]
        .into_iter()
        .map(|(u, c)| (u.to_string(), c.to_string()))
        .collect();

        ValidationPipeline::new(
            registry,
            Arc::new(StaticFetcher { pages }),
            Arc::new(KeywordInsightAnalyzer::new()),
            CrawlConfig::default(),
        )
    }

    fn item() -> ContentItem {
        ContentItem::new(
            "https://coindesk.com/markets/weekly",
            "BTC rallied 8% this week on strong ETF inflows. \
             See the bitcoin market analysis https://reuters.com/markets/btc and the \
             crypto price forecast https://100xgems.com/analysis/next for contrast. \
             Also bitcoin market analysis https://dead-link.example/research here.",
            ContentKind::WebPage,
        )
    }

    #[tokio::test]
    async fn test_evaluate_item() {
        let registry = Arc::new(DomainRegistry::with_curated_seeds());
        let conclusion = pipeline(registry.clone()).evaluate(&item()).await;

        assert_eq!(conclusion.crawled.len(), 2);
        assert_eq!(conclusion.stop_reason, StopReason::FrontierExhausted);
        assert!(conclusion.insights.len() >= 3);
        assert!((0.1..=1.0).contains(&conclusion.confidence));

        // Primary + two crawled peers
        assert_eq!(
            conclusion.breakdown,
            SourceReliabilityBreakdown {
                reliable: 2,
                neutral: 0,
                unreliable: 1,
                total: 3,
            }
        );
        assert_eq!(conclusion.sources[0].source_type, ValidationSourceType::Primary);
        assert_eq!(conclusion.sources.len(), 3);

        // The dead link was charged a fetch failure
        assert_eq!(registry.record("dead-link.example").unwrap().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_red_flagged_subject_has_no_source_weight() {
        let registry = Arc::new(DomainRegistry::with_curated_seeds());
        for _ in 0..3 {
            registry.report("coindesk.com", false);
        }
        assert_eq!(registry.membership("coindesk.com"), Membership::RedFlagged);

        let conclusion = pipeline(registry).evaluate(&item()).await;
        assert_eq!(conclusion.sources[0].reliability, 0.0);
    }

    #[tokio::test]
    async fn test_report_validation_uses_shared_counters() {
        let registry = Arc::new(DomainRegistry::with_curated_seeds());
        let pipeline = pipeline(registry.clone());
        let conclusion = pipeline.evaluate(&item()).await;

        let before = registry.accuracy("reuters.com").unwrap();
        pipeline.report_validation(&conclusion, false);
        let after = registry.accuracy("reuters.com").unwrap();

        assert_eq!(after.total, before.total + 1);
        assert_eq!(after.correct, before.correct);
        assert_eq!(registry.record("coindesk.com").unwrap().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_cancelled_evaluation_still_concludes() {
        let registry = Arc::new(DomainRegistry::with_curated_seeds());
        let (cancel, signal) = credence_engine::CrawlCancel::pair();
        cancel.cancel();

        let conclusion = pipeline(registry).evaluate_with_cancel(&item(), &signal).await;
        assert_eq!(conclusion.stop_reason, StopReason::Cancelled);
        assert!(conclusion.crawled.is_empty());
        assert_eq!(conclusion.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_breakdown_counts_only_kept_sources() {
        let registry = Arc::new(DomainRegistry::with_curated_seeds());
        let pages: HashMap<String, String> = [
            "https://100xgems.com/analysis/next",
            "https://moonshotcalls.io/analysis/next",
        ]
        .into_iter()
        .map(|u| (u.to_string(), "Moon soon, trust us.".to_string()))
        .collect();
        let pipeline = ValidationPipeline::new(
            registry,
            Arc::new(StaticFetcher { pages }),
            Arc::new(KeywordInsightAnalyzer::new()),
            CrawlConfig::default(),
        );
        let item = ContentItem::new(
            "https://coindesk.com/markets/weekly",
            "BTC rallied 8% this week. \
             Crypto price forecast https://100xgems.com/analysis/next and \
             crypto price forecast https://moonshotcalls.io/analysis/next today.",
            ContentKind::WebPage,
        );

        let conclusion = pipeline.evaluate(&item).await;

        assert_eq!(conclusion.crawled.len(), 2);
        assert_eq!(conclusion.sources.len(), 2);
        assert_eq!(
            conclusion.breakdown,
            SourceReliabilityBreakdown {
                reliable: 1,
                neutral: 0,
                unreliable: 1,
                total: 2,
            }
        );
    }

    #[test]
    fn test_build_registry_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let seeded = DomainRegistry::new();
        for _ in 0..5 {
            seeded.report("fresh-desk.example", true);
        }
        crate::save_snapshot(&seeded, &path).unwrap();

        let mut config = CredenceConfig::default();
        config.registry.snapshot_path = Some(path);
        let registry = build_registry(&config).unwrap();

        assert_eq!(registry.membership("coindesk.com"), Membership::Reliable);
        assert_eq!(registry.membership("fresh-desk.example"), Membership::Reliable);
    }
}

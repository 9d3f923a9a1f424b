//! Link Frontier Crawler
//!
//! Bounded recursive fetch-and-follow starting from a seed page:
//! - Every URL is claimed in the processed set *before* it is fetched, so no
//!   URL is ever fetched twice, even across a link cycle
//! - The processed set (seed included) never exceeds `max_processed`
//! - Each fetch is timeout-bounded and never retried
//! - Fetch failures and empty pages count against the domain; refusals of
//!   red-flagged domains do not
//!
//! Every link at one level is fetched and recorded, but only the content of
//! the last successful fetch (in attempt order) seeds the next extraction
//! pass. Outbound links of the other pages at that level are not followed.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use credence_core::{ContentKind, DomainRegistry, Insight};

use crate::{extract_links, FetchError, FrontierConfig, ProcessedSet, SharedAnalyzer, SharedFetcher};

/// Crawler limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Hard cap on processed URLs, seed included
    pub max_processed: usize,
    /// Links kept per extraction pass
    pub max_links_per_page: usize,
    /// Relevance floor for candidate links
    pub min_relevance: f64,
    /// Characters on each side of a link scored for relevance
    pub relevance_window: usize,
    /// Links fetched concurrently within one level
    pub max_concurrent: usize,
    /// Per-fetch timeout in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_processed: 50,
            max_links_per_page: 15,
            min_relevance: 0.3,
            relevance_window: 120,
            max_concurrent: 4,
            fetch_timeout_secs: 30,
        }
    }
}

impl CrawlConfig {
    fn frontier(&self) -> FrontierConfig {
        FrontierConfig {
            max_links: self.max_links_per_page,
            min_relevance: self.min_relevance,
            window: self.relevance_window,
        }
    }
}

/// Handle used to cancel a running crawl
#[derive(Debug)]
pub struct CrawlCancel {
    tx: watch::Sender<bool>,
}

impl CrawlCancel {
    /// Create a cancel handle and the signal a crawl checks
    pub fn pair() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cancellation flag checked at the top of every crawl iteration
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that is never raised
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// One successfully fetched link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledLink {
    pub url: String,
    pub insights: Vec<Insight>,
    /// Registry score of the link's domain after the fetch was recorded
    pub source_reliability: f64,
}

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No unprocessed relevant links remained
    FrontierExhausted,
    /// The processed set reached its cap
    CapReached,
    /// The cancel signal was raised
    Cancelled,
}

/// Full result of one crawl session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub session_id: Uuid,
    pub links: Vec<CrawledLink>,
    /// Number of processed URLs, seed included
    pub processed: usize,
    pub stop_reason: StopReason,
}

/// Follows links outward from a seed page, bounded by the registry
pub struct LinkCrawler {
    registry: Arc<DomainRegistry>,
    fetcher: SharedFetcher,
    analyzer: SharedAnalyzer,
    config: CrawlConfig,
}

impl LinkCrawler {
    pub fn new(
        registry: Arc<DomainRegistry>,
        fetcher: SharedFetcher,
        analyzer: SharedAnalyzer,
        config: CrawlConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            analyzer,
            config,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Follow links from the seed and return every successfully fetched link
    pub async fn follow_links(
        &self,
        seed_content: &str,
        seed_url: &str,
        cap: usize,
    ) -> Vec<CrawledLink> {
        self.crawl(seed_content, seed_url, cap, &CancelSignal::never())
            .await
            .links
    }

    /// Run a crawl session that can be cancelled between levels
    pub async fn crawl(
        &self,
        seed_content: &str,
        seed_url: &str,
        cap: usize,
        cancel: &CancelSignal,
    ) -> CrawlOutcome {
        let session_id = Uuid::new_v4();
        let cap = cap.clamp(1, self.config.max_processed.max(1));
        let frontier = self.config.frontier();
        let processed = ProcessedSet::new();
        processed.claim(seed_url, cap);

        info!("Crawl {} starting from {} (cap {})", session_id, seed_url, cap);

        let mut links = Vec::new();
        let mut current_content = seed_content.to_string();

        let stop_reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if processed.len() >= cap {
                break StopReason::CapReached;
            }

            let candidates = extract_links(&current_content, &processed, &self.registry, &frontier);
            if candidates.is_empty() {
                break StopReason::FrontierExhausted;
            }

            let claimed: Vec<String> = candidates
                .into_iter()
                .filter(|candidate| processed.claim(&candidate.url, cap))
                .map(|candidate| candidate.url)
                .collect();
            if claimed.is_empty() {
                break StopReason::CapReached;
            }

            debug!("Crawl {} fetching {} links", session_id, claimed.len());

            // `buffered` yields in attempt order regardless of completion order;
            // each outcome is reported before the next fetch is started
            let mut fetches = std::pin::pin!(stream::iter(claimed)
                .map(|url| async move {
                    let result = self.fetch_bounded(&url).await;
                    (url, result)
                })
                .buffered(self.config.max_concurrent.max(1)));

            while let Some((url, result)) = fetches.next().await {
                match result {
                    Ok(content) if !content.trim().is_empty() => {
                        self.registry.report_fetch(&url, true);
                        let insights = self.analyzer.analyze(&content, ContentKind::LinkedPage).await;
                        debug!("{} yielded {} insights", url, insights.len());
                        links.push(CrawledLink {
                            source_reliability: self.registry.score(&url),
                            url,
                            insights,
                        });
                        current_content = content;
                    }
                    Ok(_) => {
                        warn!("Empty content from {}", url);
                        self.registry.report_fetch(&url, false);
                    }
                    Err(e) if !e.penalizes() => {
                        debug!("Skipped {}: {}", url, e);
                    }
                    Err(e) => {
                        warn!("Failed to fetch {}: {}", url, e);
                        self.registry.report_fetch(&url, false);
                    }
                }
            }
        };

        info!(
            "Crawl {} stopped ({:?}): {} links fetched, {} processed",
            session_id,
            stop_reason,
            links.len(),
            processed.len()
        );

        CrawlOutcome {
            session_id,
            links,
            processed: processed.len(),
            stop_reason,
        }
    }

    async fn fetch_bounded(&self, url: &str) -> Result<String, FetchError> {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        match tokio::time::timeout(timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }
}

//! Collaborator interfaces for the crawler

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use credence_core::{ContentKind, Insight};

/// Errors from fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Domain {0} is red-flagged")]
    RedFlagged(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Empty content from {0}")]
    Empty(String),
}

impl FetchError {
    /// Whether this failure should count against the domain.
    ///
    /// Refusals of red-flagged domains are not the domain's fault a second time.
    pub fn penalizes(&self) -> bool {
        !matches!(self, FetchError::RedFlagged(_))
    }
}

/// Fetches the readable content behind a URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page text. Empty content may be returned as `Ok("")`;
    /// the crawler treats it the same as a failure.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

/// Turns content into insights
#[async_trait]
pub trait InsightAnalyzer: Send + Sync {
    async fn analyze(&self, content: &str, kind: ContentKind) -> Vec<Insight>;
}

/// Shared fetcher handle
pub type SharedFetcher = Arc<dyn PageFetcher>;

/// Shared analyzer handle
pub type SharedAnalyzer = Arc<dyn InsightAnalyzer>;

//! Page fetchers
//!
//! `HttpFetcher` performs the actual request; `GatedFetcher` sits in front
//! of any fetcher and refuses domains the registry has red-flagged.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use credence_core::{canonicalize_domain, DomainRegistry};
use credence_net::{create_client, scrape_url, HttpConfig, NetError};

use crate::{FetchError, PageFetcher};

/// Fetches pages over HTTP and returns their extracted text
pub struct HttpFetcher {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpConfig) -> Result<Self, NetError> {
        let client = create_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let page = scrape_url(&self.client, url, &self.config)
            .await
            .map_err(|e| match e {
                NetError::Timeout(secs) => {
                    FetchError::Timeout(std::time::Duration::from_secs(secs))
                }
                other => FetchError::Network(other.to_string()),
            })?;

        if page.text.is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }

        debug!(
            "Fetched {} chars from {} ({}){}",
            page.char_count,
            url,
            page.title.as_deref().unwrap_or("untitled"),
            if page.truncated { ", truncated" } else { "" }
        );
        Ok(page.text)
    }
}

/// Refuses red-flagged domains before delegating to the inner fetcher
pub struct GatedFetcher<F> {
    registry: Arc<DomainRegistry>,
    inner: F,
}

impl<F: PageFetcher> GatedFetcher<F> {
    pub fn new(registry: Arc<DomainRegistry>, inner: F) -> Self {
        Self { registry, inner }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for GatedFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if self.registry.is_red_flagged(url) {
            let domain = canonicalize_domain(url);
            debug!("Refusing fetch of {}: {} is red-flagged", url, domain);
            return Err(FetchError::RedFlagged(domain));
        }
        self.inner.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("content".to_string())
        }
    }

    #[tokio::test]
    async fn test_gate_refuses_red_flagged_without_penalty() {
        let registry = Arc::new(DomainRegistry::with_curated_seeds());
        for _ in 0..3 {
            registry.report("coindesk.com", false);
        }
        let before = registry.record("coindesk.com").unwrap();

        let gated = GatedFetcher::new(
            registry.clone(),
            CountingFetcher {
                calls: AtomicUsize::new(0),
            },
        );

        let err = gated.fetch("https://www.coindesk.com/x").await.unwrap_err();
        assert!(matches!(err, FetchError::RedFlagged(ref d) if d == "coindesk.com"));
        assert!(!err.penalizes());
        assert_eq!(gated.inner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.record("coindesk.com").unwrap(), before);
    }

    #[tokio::test]
    async fn test_gate_passes_through() {
        let registry = Arc::new(DomainRegistry::new());
        let gated = GatedFetcher::new(
            registry,
            CountingFetcher {
                calls: AtomicUsize::new(0),
            },
        );

        assert_eq!(gated.fetch("https://example.com").await.unwrap(), "content");
        assert_eq!(gated.inner.calls.load(Ordering::SeqCst), 1);
    }
}

//! Link frontier
//!
//! Pulls absolute URLs out of page text, scores how relevant the text around
//! each one is, and ranks survivors by `priority * relevance * reliability`.

use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use credence_core::DomainRegistry;
use credence_net::is_fetchable;

/// Absolute http(s) URLs, stopping at whitespace, quotes and brackets
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>()\[\]{}]+"#).unwrap()
});

/// Words that make surrounding text worth following
const RELEVANCE_KEYWORDS: &[&str] = &[
    "analysis", "research", "report", "price", "market", "trading", "chart", "forecast",
    "bitcoin", "btc", "ethereum", "eth", "crypto", "token", "defi", "onchain", "on-chain",
    "volume", "liquidity", "support", "resistance", "bullish", "bearish", "strategy", "data",
];

/// File types that never carry analysis text
const SKIPPED_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".woff",
    ".woff2", ".ttf", ".zip", ".gz", ".mp3", ".mp4",
];

/// Path fragments that usually hold long-form analysis
const BOOSTED_PATHS: &[&str] = &["/analysis", "/research", "/news", "/markets", "/report", "/insights"];

/// Hosts that mostly redirect or host short posts
const DAMPENED_HOSTS: &[&str] = &["t.co", "bit.ly", "tinyurl.com", "twitter.com", "x.com", "facebook.com", "instagram.com"];

/// Baseline relevance before keyword hits
const BASE_RELEVANCE: f64 = 0.2;

/// Relevance gained per keyword hit in the window
const KEYWORD_RELEVANCE: f64 = 0.1;

/// A link found in page text, ready to rank
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCandidate {
    pub url: String,
    /// Structural preference for the URL shape
    pub priority: f64,
    /// Topical relevance of the surrounding text in `[0.0, 1.0]`
    pub relevance: f64,
    /// Registry score of the link's domain
    pub reliability: f64,
}

impl LinkCandidate {
    pub fn rank(&self) -> f64 {
        self.priority * self.relevance * self.reliability
    }
}

/// Link extraction parameters
#[derive(Debug, Clone)]
pub struct FrontierConfig {
    /// Maximum links kept per page
    pub max_links: usize,
    /// Candidates below this relevance are dropped
    pub min_relevance: f64,
    /// Characters on each side of a URL considered for relevance
    pub window: usize,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            max_links: 15,
            min_relevance: 0.3,
            window: 120,
        }
    }
}

/// URLs that have been claimed for fetching.
///
/// `claim` is a single test-and-insert, so concurrent crawlers sharing one set
/// can never both fetch the same URL.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    urls: Mutex<HashSet<String>>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the URL processed. Returns `false` if it already was, or if the
    /// set already holds `cap` entries.
    pub fn claim(&self, url: &str, cap: usize) -> bool {
        let mut urls = self.urls.lock();
        if urls.len() >= cap || urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.lock().is_empty()
    }
}

/// Extract, filter and rank the links in `content`.
///
/// Drops URLs already in `processed`, static assets and anything below the
/// relevance floor, then keeps the best `max_links` by rank.
pub fn extract_links(
    content: &str,
    processed: &ProcessedSet,
    registry: &DomainRegistry,
    config: &FrontierConfig,
) -> Vec<LinkCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for m in URL_REGEX.find_iter(content) {
        let url = trim_url(m.as_str());
        if !is_fetchable(url) || is_static_asset(url) {
            continue;
        }
        if processed.contains(url) || !seen.insert(url.to_string()) {
            continue;
        }

        let relevance = relevance(&surrounding_text(content, m.start(), m.end(), config.window));
        if relevance < config.min_relevance {
            continue;
        }

        candidates.push(LinkCandidate {
            url: url.to_string(),
            priority: priority(url),
            relevance,
            reliability: registry.score(url),
        });
    }

    // Stable sort keeps document order among equal ranks
    candidates.sort_by(|a, b| b.rank().total_cmp(&a.rank()));
    candidates.truncate(config.max_links);
    candidates
}

/// Relevance of a text window in `[0.0, 1.0]`
pub fn relevance(window: &str) -> f64 {
    let lower = window.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();

    let hits = RELEVANCE_KEYWORDS
        .iter()
        .filter(|keyword| words.contains(keyword))
        .count();

    (BASE_RELEVANCE + hits as f64 * KEYWORD_RELEVANCE).clamp(0.0, 1.0)
}

/// Structural priority of a URL
pub fn priority(url: &str) -> f64 {
    let lower = url.to_lowercase();
    let host = credence_core::canonicalize_domain(&lower);

    if DAMPENED_HOSTS.contains(&host.as_str()) {
        return 0.5;
    }
    if BOOSTED_PATHS.iter().any(|p| lower.contains(p)) {
        return 1.5;
    }
    1.0
}

fn trim_url(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

fn is_static_asset(url: &str) -> bool {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Text around a match with the URL itself cut out
fn surrounding_text(content: &str, start: usize, end: usize, window: usize) -> String {
    let before: String = {
        let chars: Vec<char> = content[..start].chars().rev().take(window).collect();
        chars.into_iter().rev().collect()
    };
    let after: String = content[end..].chars().take(window).collect();
    format!("{} {}", before, after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_core::Membership;

    #[test]
    fn test_relevance() {
        assert!((relevance("nothing to see here") - 0.2).abs() < 1e-9);
        assert!((relevance("Bitcoin price analysis") - 0.5).abs() < 1e-9);
        assert_eq!(relevance(&RELEVANCE_KEYWORDS.join(" ")), 1.0);
    }

    #[test]
    fn test_priority() {
        assert_eq!(priority("https://coindesk.com/markets/2024/btc"), 1.5);
        assert_eq!(priority("https://t.co/abc"), 0.5);
        assert_eq!(priority("https://example.com/about"), 1.0);
    }

    #[test]
    fn test_low_relevance_and_assets_dropped() {
        let registry = DomainRegistry::new();
        let content = "Cute cats https://cats.example/gallery and a logo \
            https://coindesk.com/logo.png next to bitcoin market analysis";
        let config = FrontierConfig {
            window: 20,
            ..Default::default()
        };
        let links = extract_links(content, &ProcessedSet::new(), &registry, &config);
        assert!(links.is_empty());
    }

    #[test]
    fn test_processed_and_duplicates_dropped() {
        let registry = DomainRegistry::new();
        let processed = ProcessedSet::new();
        assert!(processed.claim("https://a.example/research", 50));

        let content = "bitcoin market analysis https://a.example/research \
            bitcoin market analysis https://b.example/research. \
            bitcoin market analysis https://b.example/research";
        let links = extract_links(content, &processed, &registry, &FrontierConfig::default());

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://b.example/research");
    }

    #[test]
    fn test_ranked_by_reliability() {
        let registry = DomainRegistry::with_curated_seeds();
        let content = "bitcoin price analysis https://100xgems.com/post \
            bitcoin price analysis https://reuters.com/post";
        let links = extract_links(content, &ProcessedSet::new(), &registry, &FrontierConfig::default());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://reuters.com/post");
        assert_eq!(registry.membership("100xgems.com"), Membership::Unreliable);
        assert!(links[0].rank() > links[1].rank());
    }

    #[test]
    fn test_keeps_top_links() {
        let registry = DomainRegistry::new();
        let content: String = (0..30)
            .map(|i| format!("crypto market analysis https://site{}.example/page ", i))
            .collect();
        let config = FrontierConfig::default();
        let links = extract_links(&content, &ProcessedSet::new(), &registry, &config);
        assert_eq!(links.len(), config.max_links);
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let processed = ProcessedSet::new();
        let wins: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| processed.claim("https://race.example/research", 50)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap() as usize)
                .sum()
        });

        assert_eq!(wins, 1);
        assert_eq!(processed.len(), 1);
    }

    #[test]
    fn test_processed_set_cap() {
        let processed = ProcessedSet::new();
        assert!(processed.claim("https://a.example", 2));
        assert!(!processed.claim("https://a.example", 2));
        assert!(processed.claim("https://b.example", 2));
        assert!(!processed.claim("https://c.example", 2));
        assert_eq!(processed.len(), 2);
    }
}

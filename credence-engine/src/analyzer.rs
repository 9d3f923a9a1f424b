//! Keyword insight analyzer
//!
//! Default `InsightAnalyzer`: splits text into sentences and keeps the ones
//! that carry a market signal (directional language, levels, targets or
//! percentage moves).

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use credence_core::{ContentKind, Insight};

use crate::InsightAnalyzer;

/// Maximum insights taken from one piece of content
pub const MAX_INSIGHTS_PER_CONTENT: usize = 20;

static SENTENCE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+(?:\s+|$)|\n+").unwrap());

static PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+(?:\.\d+)?\s?%").unwrap());

static SIGNAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(bullish|bearish|support|resistance|breakout|breakdown|price target|target|accumulat\w*|sell-off|rally|long|short|stop loss|entry)\b",
    )
    .unwrap()
});

/// Sentences shorter than this are ignored
const MIN_SENTENCE_LEN: usize = 20;

#[derive(Debug, Default, Clone)]
pub struct KeywordInsightAnalyzer;

impl KeywordInsightAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of `analyze`
    pub fn extract(&self, content: &str, kind: ContentKind) -> Vec<Insight> {
        let mut insights: Vec<Insight> = Vec::new();

        for sentence in SENTENCE_SPLIT.split(content) {
            let sentence = sentence.trim();
            if sentence.len() < MIN_SENTENCE_LEN {
                continue;
            }

            let signal = SIGNAL_REGEX
                .find(sentence)
                .map(|m| m.as_str().to_lowercase())
                .or_else(|| PERCENT_REGEX.find(sentence).map(|m| m.as_str().to_string()));

            if let Some(signal) = signal {
                if insights.iter().any(|i| i.text == sentence) {
                    continue;
                }
                insights.push(Insight::new(sentence, kind).with_signal(&signal));
                if insights.len() >= MAX_INSIGHTS_PER_CONTENT {
                    break;
                }
            }
        }

        insights
    }
}

#[async_trait]
impl InsightAnalyzer for KeywordInsightAnalyzer {
    async fn analyze(&self, content: &str, kind: ContentKind) -> Vec<Insight> {
        self.extract(content, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_signal_sentences() {
        let text = "Welcome to the blog. BTC looks bullish above the 60k support level. \
            Subscribe to our newsletter today! ETH dropped 12.5% over the weekend session.";
        let insights = KeywordInsightAnalyzer::new().extract(text, ContentKind::WebPage);

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].signal.as_deref(), Some("bullish"));
        assert_eq!(insights[1].signal.as_deref(), Some("12.5%"));
        assert_eq!(insights[1].source_kind, ContentKind::WebPage);
    }

    #[test]
    fn test_caps_and_dedups() {
        let mut text = String::new();
        for i in 0..40 {
            text.push_str(&format!("Resistance number {} is holding firmly. ", i));
        }
        text.push_str("Resistance number 0 is holding firmly. ");

        let insights = KeywordInsightAnalyzer::new().extract(&text, ContentKind::SocialPost);
        assert_eq!(insights.len(), MAX_INSIGHTS_PER_CONTENT);
    }

    #[tokio::test]
    async fn test_empty_content() {
        let insights = KeywordInsightAnalyzer::new()
            .analyze("", ContentKind::Video)
            .await;
        assert!(insights.is_empty());
    }
}

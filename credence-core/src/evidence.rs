//! Evidence types shared by the crawler, synthesizer and prioritizer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The six kinds of evidence a conclusion can cite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSourceType {
    /// The content item the conclusion was derived from
    Primary,
    /// Cross-reference against previously stored records
    DbXref,
    /// Historical data for the same subject
    Historical,
    /// A third-party data API
    ExternalApi,
    /// Another page or post making a related claim
    Peer,
    /// Correlation with aggregate sentiment
    SentimentCorr,
}

/// One piece of evidence attached to a conclusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSource {
    #[serde(rename = "type")]
    pub source_type: ValidationSourceType,
    /// Opaque payload supplied by whoever gathered the evidence
    #[serde(default)]
    pub data: serde_json::Value,
    /// Reliability the gatherer assigned, in `[0.0, 1.0]`
    pub reliability: f64,
    pub timestamp: DateTime<Utc>,
    /// Where the evidence came from. Sources without a URL are treated as
    /// unknown neutral domains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ValidationSource {
    pub fn new(source_type: ValidationSourceType) -> Self {
        Self {
            source_type,
            data: serde_json::Value::Null,
            reliability: 0.5,
            timestamp: Utc::now(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability.clamp(0.0, 1.0);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// The URL used for domain lookups (empty when absent)
    pub fn locator(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }
}

/// Kind of content an item or page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    #[default]
    WebPage,
    Video,
    SocialPost,
    /// A page reached by following a link from another item
    LinkedPage,
}

/// A single finding extracted from content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub text: String,
    /// Vocabulary term that triggered the insight, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    pub source_kind: ContentKind,
}

impl Insight {
    pub fn new(text: impl Into<String>, source_kind: ContentKind) -> Self {
        Self {
            text: text.into(),
            signal: None,
            source_kind,
        }
    }

    pub fn with_signal(mut self, signal: &str) -> Self {
        self.signal = Some(signal.to_string());
        self
    }
}

/// How the evidence behind a conclusion splits across trust classes.
/// Red-flagged sources count as unreliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceReliabilityBreakdown {
    pub reliable: usize,
    pub neutral: usize,
    pub unreliable: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_source_json_shape() {
        let source = ValidationSource::new(ValidationSourceType::DbXref)
            .with_url("https://coindesk.com/x")
            .with_reliability(1.7);

        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "db_xref");
        assert_eq!(json["reliability"], 1.0);
        assert_eq!(json["url"], "https://coindesk.com/x");
    }

    #[test]
    fn test_locator_without_url() {
        let source = ValidationSource::new(ValidationSourceType::SentimentCorr);
        assert_eq!(source.locator(), "");
    }
}

//! Page scraper
//!
//! Fetches a page and reduces it to readable text. Absolute hyperlinks are
//! written inline next to their anchor text so that link extraction can
//! still see them, along with the words around them.

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::{is_fetchable, HttpConfig, NetError};

/// Text content scraped from one page
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    /// Page title (if found)
    pub title: Option<String>,
    /// Extracted text with inline links
    pub text: String,
    /// Character count
    pub char_count: usize,
    /// Whether content was truncated
    pub truncated: bool,
}

/// Scrape text content from a URL
pub async fn scrape_url(
    client: &Client,
    url: &str,
    config: &HttpConfig,
) -> Result<ScrapedPage, NetError> {
    if !is_fetchable(url) {
        return Err(NetError::InvalidUrl(url.to_string()));
    }

    debug!("Scraping: {}", url);

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            NetError::Timeout(config.timeout_secs)
        } else {
            NetError::Request(e)
        }
    })?;

    if !response.status().is_success() {
        warn!("Scrape of {} returned status: {}", url, response.status());
        return Err(NetError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.text().await?;
    let (title, text) = extract_content(&body);

    let truncated = text.chars().count() > config.max_content_length;
    let final_text = if truncated {
        text.chars().take(config.max_content_length).collect()
    } else {
        text
    };

    Ok(ScrapedPage {
        title,
        char_count: final_text.chars().count(),
        text: final_text,
        truncated,
    })
}

/// Extract title and text content from HTML
pub fn extract_content(html: &str) -> (Option<String>, String) {
    use scraper::node::Node;

    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    });

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());

    let Some(body) = body else {
        return (title, String::new());
    };

    let mut text_parts = Vec::new();

    for node_ref in body.descendants() {
        let in_excluded = || {
            node_ref.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            })
        };

        match node_ref.value() {
            Node::Text(text_node) => {
                let trimmed = text_node.trim();
                if !trimmed.is_empty() && !in_excluded() {
                    text_parts.push(trimmed.to_string());
                }
            }
            Node::Element(el) if el.name() == "a" => {
                if let Some(href) = el.attr("href").map(str::trim) {
                    if is_fetchable(href) {
                        text_parts.push(href.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    (title, normalize_whitespace(&text_parts.join(" ")))
}

/// Normalize whitespace in text
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content() {
        let html = r#"
            <html>
            <head><title>BTC Weekly</title></head>
            <body>
                <script>var x = 1;</script>
                <h1>Bitcoin outlook</h1>
                <p>Support holds at 60k.</p>
                <style>.x { color: red; }</style>
            </body>
            </html>
        "#;

        let (title, text) = extract_content(html);

        assert_eq!(title, Some("BTC Weekly".to_string()));
        assert!(text.contains("Bitcoin outlook"));
        assert!(text.contains("Support holds"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_absolute_links_kept_inline() {
        let html = r#"
            <html><body>
                <p>Read the <a href="https://messari.io/report/eth">full research report</a> today.</p>
                <a href="/relative/path">relative</a>
                <a href="mailto:desk@example.com">mail</a>
            </body></html>
        "#;

        let (_, text) = extract_content(html);

        assert!(text.contains("https://messari.io/report/eth full research report"));
        assert!(!text.contains("/relative/path"));
        assert!(!text.contains("mailto:"));
    }

    #[test]
    fn test_normalize_whitespace() {
        let input = "  hello   world  \n\t  test  ";
        let output = normalize_whitespace(input);
        assert_eq!(output, "hello world test");
    }
}

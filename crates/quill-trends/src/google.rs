//! Google Trends daily RSS feed source.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use quill_core::config::TrendsConfig;
use quill_core::error::{QuillError, QuillResult};
use quill_core::traits::TrendSource;

const FEED_URL: &str = "https://trends.google.com/trending/rss";

static ITEM_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<item>.*?<title>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</title>")
        .expect("item title pattern is valid")
});

/// Trending searches from the public Google Trends RSS feed.
pub struct GoogleTrendsSource {
    client: Client,
    feed_url: String,
    geo: String,
}

impl GoogleTrendsSource {
    pub fn new(config: &TrendsConfig) -> QuillResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuillError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            feed_url: config
                .feed_url
                .clone()
                .unwrap_or_else(|| FEED_URL.to_string()),
            geo: config.geo.clone(),
        })
    }
}

#[async_trait]
impl TrendSource for GoogleTrendsSource {
    async fn trending_searches(&self) -> QuillResult<Vec<String>> {
        let response = self
            .client
            .get(&self.feed_url)
            .query(&[("geo", self.geo.as_str())])
            .send()
            .await
            .map_err(|e| QuillError::trends(format!("Trends feed request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuillError::trends(format!("Trends feed returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| QuillError::trends(format!("Failed to read trends feed: {}", e)))?;

        let topics = parse_feed_titles(&body);
        debug!(count = topics.len(), geo = %self.geo, "Fetched trending searches");
        Ok(topics)
    }

    fn source_name(&self) -> &str {
        "google-trends-rss"
    }
}

/// Extract item titles from an RSS document, in feed order.
pub(crate) fn parse_feed_titles(xml: &str) -> Vec<String> {
    ITEM_TITLE
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape(m.as_str().trim()))
        .filter(|title| !title.is_empty())
        .collect()
}

fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

//! Trend suggestions with fallbacks.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use quill_core::config::TrendsConfig;
use quill_core::error::QuillResult;
use quill_core::traits::{Trend, TrendSource};

use crate::google::GoogleTrendsSource;

/// Area value that disables topic filtering.
pub const GENERAL_AREA: &str = "general";

/// Platform labels assigned round-robin to suggestions.
pub const PLATFORM_LABELS: [&str; 3] = ["Twitter/X", "LinkedIn", "Threads"];

/// Builds trend suggestions from a [`TrendSource`].
///
/// Never fails: upstream errors and empty results are replaced by templated
/// topics for the requested area.
pub struct TrendsService {
    source: Arc<dyn TrendSource>,
    max_topics: usize,
}

impl TrendsService {
    pub fn new(source: Arc<dyn TrendSource>, max_topics: usize) -> Self {
        Self {
            source,
            max_topics: max_topics.max(1),
        }
    }

    /// Service backed by the Google Trends feed.
    pub fn from_config(config: &TrendsConfig) -> QuillResult<Self> {
        let source = GoogleTrendsSource::new(config)?;
        Ok(Self::new(Arc::new(source), config.max_topics))
    }

    /// Trend suggestions for an area (`general` when absent or blank).
    pub async fn trends(&self, area: Option<&str>) -> Vec<Trend> {
        let area = area
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(GENERAL_AREA);

        match self.source.trending_searches().await {
            Ok(topics) => {
                let trends = self.select(&topics, area);
                if trends.is_empty() {
                    debug!(
                        source = self.source.source_name(),
                        area, "No upstream topics matched, using templated trends"
                    );
                    templated_trends(area)
                } else {
                    trends
                }
            }
            Err(e) => {
                warn!(
                    source = self.source.source_name(),
                    error = %e,
                    "Trends upstream unavailable, using fallback"
                );
                fallback_trends(area)
            }
        }
    }

    /// Take the top topics, assign platforms, then filter by area.
    fn select(&self, topics: &[String], area: &str) -> Vec<Trend> {
        let needle = area.to_lowercase();
        let general = needle == GENERAL_AREA;
        let mut rng = rand::thread_rng();

        topics
            .iter()
            .take(self.max_topics)
            .enumerate()
            .filter(|(_, topic)| general || topic.to_lowercase().contains(&needle))
            .map(|(i, topic)| {
                Trend::new(
                    topic.clone(),
                    engagement(&mut rng, 150, 300),
                    PLATFORM_LABELS[i % PLATFORM_LABELS.len()],
                )
            })
            .collect()
    }
}

fn engagement<R: Rng>(rng: &mut R, low: u32, high: u32) -> String {
    format!("+{}%", rng.gen_range(low..=high))
}

/// Six area-specific topics used when upstream has nothing relevant.
pub fn templated_trends(area: &str) -> Vec<Trend> {
    let area = title_case(area);
    let mut rng = rand::thread_rng();

    let templates: [(String, u32, u32, &str); 6] = [
        (format!("Breaking: {} Innovation", area), 180, 280, "Twitter/X"),
        (format!("The Future of {}", area), 150, 250, "LinkedIn"),
        (format!("{} Industry Insights", area), 160, 290, "Threads"),
        (format!("Top {} Trends This Week", area), 170, 260, "Twitter/X"),
        (format!("{} Best Practices 2024", area), 155, 275, "LinkedIn"),
        (format!("What's Hot in {}", area), 165, 285, "Threads"),
    ];

    templates
        .into_iter()
        .map(|(topic, low, high, platform)| {
            Trend::new(topic, engagement(&mut rng, low, high), platform)
        })
        .collect()
}

/// Three area-specific topics used when the upstream call fails.
pub fn fallback_trends(area: &str) -> Vec<Trend> {
    let area = title_case(area);
    let mut rng = rand::thread_rng();

    ["Updates", "News", "Discussion"]
        .iter()
        .zip(PLATFORM_LABELS)
        .map(|(suffix, platform)| {
            Trend::new(
                format!("{} {}", area, suffix),
                engagement(&mut rng, 150, 280),
                platform,
            )
        })
        .collect()
}

/// Capitalise the first letter of every word and lowercase the rest.
pub(crate) fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

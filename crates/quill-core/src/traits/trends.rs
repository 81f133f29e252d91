//! Trends source trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::QuillResult;

/// A trending topic suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    /// Topic headline.
    pub topic: String,
    /// Estimated engagement, formatted like `+215%`.
    pub engagement: String,
    /// Platform label the topic is suggested for.
    pub platform: String,
}

impl Trend {
    pub fn new(
        topic: impl Into<String>,
        engagement: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            engagement: engagement.into(),
            platform: platform.into(),
        }
    }
}

/// Upstream provider of raw trending search terms.
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Current trending searches, most popular first.
    async fn trending_searches(&self) -> QuillResult<Vec<String>>;

    /// Name used in logs.
    fn source_name(&self) -> &str;
}

//! Publisher that acknowledges without delivering anything.

use async_trait::async_trait;
use tracing::info;

use crate::error::QuillResult;
use crate::traits::{Publication, PublishReceipt, Publisher};

/// Stand-in publisher until real platform integrations exist.
#[derive(Debug, Clone, Default)]
pub struct StubPublisher;

impl StubPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, publication: &Publication) -> QuillResult<PublishReceipt> {
        let label = publication.platform.to_string();
        info!(
            platform = %label,
            chars = publication.content_text.chars().count(),
            "Stub publish accepted"
        );

        Ok(PublishReceipt {
            success: true,
            message: format!("Content posted to {} successfully!", label),
            platform: label,
            mock: true,
        })
    }
}

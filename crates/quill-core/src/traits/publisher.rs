//! Platform publishing trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{QuillError, QuillResult};

/// Social platforms content can be published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Platform {
    #[strum(to_string = "Twitter/X", serialize = "twitter", serialize = "x")]
    Twitter,
    #[strum(to_string = "LinkedIn")]
    LinkedIn,
    #[strum(to_string = "Threads")]
    Threads,
}

impl Platform {
    /// Parse a user-supplied platform name.
    pub fn parse(raw: &str) -> QuillResult<Self> {
        raw.trim()
            .parse()
            .map_err(|_| QuillError::unsupported_platform(raw.to_lowercase()))
    }
}

/// A request to publish text to one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub content_text: String,
    pub platform: Platform,
}

impl Publication {
    /// Validate raw input into a publication.
    pub fn from_raw(content_text: &str, platform: &str) -> QuillResult<Self> {
        if content_text.is_empty() || platform.is_empty() {
            return Err(QuillError::validation("Content and platform are required"));
        }
        Ok(Self {
            content_text: content_text.to_string(),
            platform: Platform::parse(platform)?,
        })
    }
}

/// Acknowledgement returned by a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub success: bool,
    pub message: String,
    /// Display label of the target platform.
    pub platform: String,
    /// True when nothing was actually delivered.
    pub mock: bool,
}

/// Delivers content to a social platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, publication: &Publication) -> QuillResult<PublishReceipt>;
}

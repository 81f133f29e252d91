//! Content entry types.
//!
//! A [`ContentEntry`] is one immutable row in a version chain. Entries that
//! share a `(title, platform)` pair form a group; exactly one entry of a
//! non-empty group carries `is_latest = true`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QuillError, QuillResult};

/// Platform filter value that disables platform filtering.
pub const ALL_PLATFORMS: &str = "all";

/// Expected format of the date filter.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored content version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Store-assigned identifier, never reused
    pub id: i64,
    /// Groups versions together with `platform`
    pub title: String,
    /// Free-text platform name
    pub platform: String,
    /// Descriptive label (post, thread, article...)
    pub content_type: String,
    /// Body text
    pub content_text: String,
    /// Sequential version number within the group (1, 2, 3...)
    pub version: u32,
    /// Whether this is the current version of its group
    pub is_latest: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentEntry {
    /// The `(title, platform)` key of this entry's group.
    pub fn group(&self) -> (&str, &str) {
        (&self.title, &self.platform)
    }
}

/// Input for creating a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContent {
    pub title: String,
    pub platform: String,
    pub content_type: String,
    pub content_text: String,
}

impl NewContent {
    pub fn new(
        title: impl Into<String>,
        platform: impl Into<String>,
        content_type: impl Into<String>,
        content_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            platform: platform.into(),
            content_type: content_type.into(),
            content_text: content_text.into(),
        }
    }
}

/// Changes applied when appending a new version of an existing entry.
///
/// Absent (or empty) fields are copied from the entry being updated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content_text: Option<String>,
}

impl ContentUpdate {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content_text(mut self, text: impl Into<String>) -> Self {
        self.content_text = Some(text.into());
        self
    }

    pub(crate) fn title_or<'a>(&'a self, existing: &'a str) -> &'a str {
        non_empty(self.title.as_deref()).unwrap_or(existing)
    }

    pub(crate) fn content_text_or<'a>(&'a self, existing: &'a str) -> &'a str {
        non_empty(self.content_text.as_deref()).unwrap_or(existing)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Filters for listing entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilter {
    /// Restrict to entries flagged `is_latest`
    #[serde(default = "default_latest_only")]
    pub latest_only: bool,
    /// Case-insensitive substring match on platform; `"all"` disables it
    #[serde(default)]
    pub platform: Option<String>,
    /// Calendar date (`YYYY-MM-DD`) that `created_at` must fall on
    #[serde(default)]
    pub date: Option<String>,
}

fn default_latest_only() -> bool {
    true
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self {
            latest_only: true,
            platform: None,
            date: None,
        }
    }
}

impl ContentFilter {
    /// Include every stored version, not just the latest ones.
    pub fn all_versions() -> Self {
        Self {
            latest_only: false,
            ..Default::default()
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Platform needle, ASCII-lowercased, or `None` when filtering is disabled.
    ///
    /// SQLite's `lower()` only folds ASCII, so the needle must be folded the
    /// same way to match the stored column.
    pub fn platform_needle(&self) -> Option<String> {
        self.platform
            .as_deref()
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case(ALL_PLATFORMS))
            .map(str::to_ascii_lowercase)
    }

    /// Parsed date filter.
    pub fn parsed_date(&self) -> QuillResult<Option<NaiveDate>> {
        match self.date.as_deref() {
            None => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Some)
                .map_err(|_| {
                    QuillError::validation_with_suggestion(
                        "Invalid date format. Use YYYY-MM-DD",
                        format!("Got '{}'", raw),
                    )
                }),
        }
    }
}

/// Fixed-width UTC representation used for storage.
///
/// Text ordering of this format matches chronological ordering and the first
/// ten characters are the calendar date.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> QuillResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| QuillError::database(format!("Corrupt timestamp '{}': {}", raw, e)))
}

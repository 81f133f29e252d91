//! quill-trends - Trending topic suggestions for quill.
//!
//! Raw trending searches come from a [`TrendSource`]; [`TrendsService`]
//! turns them into platform-tagged suggestions and falls back to templated
//! topics when upstream is empty or unavailable.
//!
//! # Example
//!
//! ```ignore
//! use quill_trends::TrendsService;
//!
//! let service = TrendsService::from_config(&config.trends)?;
//! let trends = service.trends(Some("technology")).await;
//! ```

mod google;
mod service;

pub use google::GoogleTrendsSource;
pub use service::{fallback_trends, templated_trends, TrendsService, GENERAL_AREA, PLATFORM_LABELS};

// Re-export core types for convenience
pub use quill_core::traits::{Trend, TrendSource};

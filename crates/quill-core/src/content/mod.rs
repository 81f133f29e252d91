//! Versioned content store.
//!
//! Each create or update appends an immutable entry to the version chain of
//! its `(title, platform)` group and moves the "latest" flag onto it.

mod entry;
mod store;

pub use entry::{ContentEntry, ContentFilter, ContentUpdate, NewContent, ALL_PLATFORMS, DATE_FORMAT};
pub use store::{ContentStore, SqliteContentStore};

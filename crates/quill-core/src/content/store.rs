//! Content storage layer.
//!
//! Provides SQLite-backed persistence for versioned content entries. Every
//! write that touches the "latest" flag runs in a single transaction together
//! with the insert it belongs to.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Transaction, TransactionBehavior,
};
use tracing::{debug, warn};

use crate::content::entry::{format_timestamp, parse_timestamp};
use crate::content::{ContentEntry, ContentFilter, ContentUpdate, NewContent};
use crate::error::{QuillError, QuillResult};

/// Attempts made when a concurrent writer claims the same version number.
const MAX_VERSION_ATTEMPTS: usize = 3;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COLUMNS: &str = "id, title, platform, content_type, content_text, version, is_latest, created_at, updated_at";

/// Trait for versioned content storage operations
pub trait ContentStore: Send + Sync {
    /// Append a new entry to its group and make it the latest
    fn create(&self, content: &NewContent) -> QuillResult<ContentEntry>;

    /// Append a new version derived from entry `id`
    fn update(&self, id: i64, changes: &ContentUpdate) -> QuillResult<ContentEntry>;

    /// Get a single entry
    fn get(&self, id: i64) -> QuillResult<ContentEntry>;

    /// All entries of a group, newest version first
    fn list_versions(&self, title: &str, platform: &str) -> QuillResult<Vec<ContentEntry>>;

    /// Entries matching a filter, newest first
    fn list(&self, filter: &ContentFilter) -> QuillResult<Vec<ContentEntry>>;

    /// Permanently remove one entry
    fn delete(&self, id: i64) -> QuillResult<()>;

    /// Count total entries in store
    fn count(&self) -> QuillResult<usize>;
}

/// SQLite-backed content store
pub struct SqliteContentStore {
    conn: Mutex<Connection>,
}

impl SqliteContentStore {
    /// Open (or create) a store at the given path
    pub fn new(path: impl AsRef<Path>) -> QuillResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> QuillResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> QuillResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> QuillResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS contents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                platform TEXT NOT NULL,
                content_type TEXT NOT NULL,
                content_text TEXT NOT NULL,
                version INTEGER NOT NULL CHECK (version > 0),
                is_latest INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(title, platform, version)
            );

            CREATE INDEX IF NOT EXISTS idx_contents_latest_created
                ON contents(is_latest, created_at DESC);
        "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> QuillResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| QuillError::database("Content store connection lock poisoned"))
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> QuillResult<ContentEntry> {
        let created_at: String = row.get(7)?;
        let updated_at: String = row.get(8)?;

        Ok(ContentEntry {
            id: row.get(0)?,
            title: row.get(1)?,
            platform: row.get(2)?,
            content_type: row.get(3)?,
            content_text: row.get(4)?,
            version: row.get(5)?,
            is_latest: row.get(6)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    /// Create with an explicit timestamp.
    pub(crate) fn create_at(
        &self,
        content: &NewContent,
        now: DateTime<Utc>,
    ) -> QuillResult<ContentEntry> {
        with_version_retry(|| {
            let mut conn = self.conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            clear_latest_tx(&tx, &content.title, &content.platform, now)?;
            let version = max_version_tx(&tx, &content.title, &content.platform)? + 1;
            let entry = insert_tx(
                &tx,
                &content.title,
                &content.platform,
                &content.content_type,
                &content.content_text,
                version,
                now,
            )?;

            tx.commit()?;
            Ok(entry)
        })
    }

    /// Update with an explicit timestamp.
    pub(crate) fn update_at(
        &self,
        id: i64,
        changes: &ContentUpdate,
        now: DateTime<Utc>,
    ) -> QuillResult<ContentEntry> {
        with_version_retry(|| {
            let mut conn = self.conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing = get_tx(&tx, id)?.ok_or_else(|| QuillError::not_found(id))?;
            let title = changes.title_or(&existing.title);
            let content_text = changes.content_text_or(&existing.content_text);

            clear_latest_tx(&tx, &existing.title, &existing.platform, now)?;
            if title != existing.title {
                // Retitling moves the chain into another group, which must
                // also end up with a single latest entry.
                clear_latest_tx(&tx, title, &existing.platform, now)?;
            }

            let taken = max_version_tx(&tx, title, &existing.platform)?;
            let version = (existing.version + 1).max(taken + 1);

            let entry = insert_tx(
                &tx,
                title,
                &existing.platform,
                &existing.content_type,
                content_text,
                version,
                now,
            )?;

            tx.commit()?;
            Ok(entry)
        })
    }
}

impl ContentStore for SqliteContentStore {
    fn create(&self, content: &NewContent) -> QuillResult<ContentEntry> {
        let entry = self.create_at(content, Utc::now())?;
        debug!(
            id = entry.id,
            title = %entry.title,
            platform = %entry.platform,
            version = entry.version,
            "Content created"
        );
        Ok(entry)
    }

    fn update(&self, id: i64, changes: &ContentUpdate) -> QuillResult<ContentEntry> {
        let entry = self.update_at(id, changes, Utc::now())?;
        debug!(
            from_id = id,
            id = entry.id,
            version = entry.version,
            "Content updated as new version"
        );
        Ok(entry)
    }

    fn get(&self, id: i64) -> QuillResult<ContentEntry> {
        let conn = self.conn()?;
        get_tx(&conn, id)?.ok_or_else(|| QuillError::not_found(id))
    }

    fn list_versions(&self, title: &str, platform: &str) -> QuillResult<Vec<ContentEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"SELECT {COLUMNS}
               FROM contents
               WHERE title = ?1 AND platform = ?2
               ORDER BY version DESC"#
        ))?;

        let results = stmt.query_map(params![title, platform], |row| {
            Ok(Self::row_to_entry(row))
        })?;

        let versions: Vec<ContentEntry> = results
            .map(|r| r.map_err(QuillError::from).and_then(|inner| inner))
            .collect::<QuillResult<_>>()?;

        if versions.is_empty() {
            return Err(QuillError::group_not_found(title, platform));
        }
        Ok(versions)
    }

    fn list(&self, filter: &ContentFilter) -> QuillResult<Vec<ContentEntry>> {
        let date = filter.parsed_date()?;

        let mut sql = format!("SELECT {COLUMNS} FROM contents WHERE 1 = 1");
        let mut args: Vec<String> = Vec::new();

        if filter.latest_only {
            sql.push_str(" AND is_latest = 1");
        }
        if let Some(needle) = filter.platform_needle() {
            sql.push_str(" AND instr(lower(platform), ?) > 0");
            args.push(needle);
        }
        if let Some(day) = date {
            sql.push_str(" AND substr(created_at, 1, 10) = ?");
            args.push(day.format("%Y-%m-%d").to_string());
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok(Self::row_to_entry(row))
        })?;

        results
            .map(|r| r.map_err(QuillError::from).and_then(|inner| inner))
            .collect()
    }

    fn delete(&self, id: i64) -> QuillResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM contents WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(QuillError::not_found(id));
        }
        // Siblings keep their flags: removing the latest entry leaves the
        // group without one.
        debug!(id, "Content deleted");
        Ok(())
    }

    fn count(&self) -> QuillResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM contents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn with_version_retry<T, F>(mut op: F) -> QuillResult<T>
where
    F: FnMut() -> QuillResult<T>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_version_conflict() && attempt < MAX_VERSION_ATTEMPTS => {
                warn!(attempt, error = %e, "Version number taken by concurrent writer, retrying");
                attempt += 1;
            }
            other => return other,
        }
    }
}

fn get_tx(conn: &Connection, id: i64) -> QuillResult<Option<ContentEntry>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM contents WHERE id = ?1"))?;
    stmt.query_row(params![id], |row| Ok(SqliteContentStore::row_to_entry(row)))
        .optional()?
        .transpose()
}

fn clear_latest_tx(
    tx: &Transaction<'_>,
    title: &str,
    platform: &str,
    now: DateTime<Utc>,
) -> QuillResult<usize> {
    let cleared = tx.execute(
        r#"UPDATE contents
           SET is_latest = 0, updated_at = ?3
           WHERE title = ?1 AND platform = ?2 AND is_latest = 1"#,
        params![title, platform, format_timestamp(&now)],
    )?;
    Ok(cleared)
}

fn max_version_tx(tx: &Transaction<'_>, title: &str, platform: &str) -> QuillResult<u32> {
    let max: Option<u32> = tx.query_row(
        "SELECT MAX(version) FROM contents WHERE title = ?1 AND platform = ?2",
        params![title, platform],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0))
}

fn insert_tx(
    tx: &Transaction<'_>,
    title: &str,
    platform: &str,
    content_type: &str,
    content_text: &str,
    version: u32,
    now: DateTime<Utc>,
) -> QuillResult<ContentEntry> {
    let stamp = format_timestamp(&now);
    tx.execute(
        r#"INSERT INTO contents
           (title, platform, content_type, content_text, version, is_latest, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)"#,
        params![title, platform, content_type, content_text, version, stamp],
    )?;

    Ok(ContentEntry {
        id: tx.last_insert_rowid(),
        title: title.to_string(),
        platform: platform.to_string(),
        content_type: content_type.to_string(),
        content_text: content_text.to_string(),
        version,
        is_latest: true,
        created_at: parse_timestamp(&stamp)?,
        updated_at: parse_timestamp(&stamp)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn version_conflict() -> QuillError {
        QuillError::Database {
            message: "UNIQUE constraint failed".to_string(),
            code: ErrorCode::DbVersionConflict,
            source: None,
        }
    }

    fn post(title: &str, platform: &str, text: &str) -> NewContent {
        NewContent::new(title, platform, "post", text)
    }

    fn latest_in_group(store: &SqliteContentStore, title: &str, platform: &str) -> Vec<i64> {
        store
            .list_versions(title, platform)
            .unwrap()
            .into_iter()
            .filter(|e| e.is_latest)
            .map(|e| e.id)
            .collect()
    }

    #[test]
    fn test_create_assigns_sequential_versions() {
        let store = SqliteContentStore::in_memory().unwrap();

        for expected in 1..=4u32 {
            let entry = store.create(&post("Launch", "twitter", "body")).unwrap();
            assert_eq!(entry.version, expected);
            assert!(entry.is_latest);
            assert_eq!(latest_in_group(&store, "Launch", "twitter"), vec![entry.id]);
        }
    }

    #[test]
    fn test_groups_are_independent() {
        let store = SqliteContentStore::in_memory().unwrap();

        store.create(&post("Launch", "twitter", "a")).unwrap();
        store.create(&post("Launch", "twitter", "b")).unwrap();
        let linkedin = store.create(&post("Launch", "linkedin", "c")).unwrap();
        let other = store.create(&post("Recap", "twitter", "d")).unwrap();

        assert_eq!(linkedin.version, 1);
        assert_eq!(other.version, 1);
        assert_eq!(latest_in_group(&store, "Launch", "twitter").len(), 1);
    }

    #[test]
    fn test_create_refreshes_updated_at_of_cleared_rows() {
        let store = SqliteContentStore::in_memory().unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let t1 = t0 + ChronoDuration::hours(2);

        let v1 = store.create_at(&post("Launch", "twitter", "a"), t0).unwrap();
        store.create_at(&post("Launch", "twitter", "b"), t1).unwrap();

        let reloaded = store.get(v1.id).unwrap();
        assert!(!reloaded.is_latest);
        assert_eq!(reloaded.created_at, t0);
        assert_eq!(reloaded.updated_at, t1);
    }

    #[test]
    fn test_update_appends_new_version() {
        let store = SqliteContentStore::in_memory().unwrap();
        let v1 = store.create(&post("Launch", "twitter", "v1 text")).unwrap();

        let v2 = store
            .update(v1.id, &ContentUpdate::default().with_content_text("v2 text"))
            .unwrap();

        assert_ne!(v2.id, v1.id);
        assert_eq!(v2.version, 2);
        assert_eq!(v2.content_text, "v2 text");
        assert_eq!(v2.content_type, "post");
        assert!(v2.is_latest);

        let original = store.get(v1.id).unwrap();
        assert!(!original.is_latest);
        assert_eq!(original.content_text, "v1 text");
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let store = SqliteContentStore::in_memory().unwrap();
        let err = store.update(99, &ContentUpdate::default()).unwrap_err();
        assert!(matches!(err, QuillError::NotFound { .. }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_update_of_older_version_takes_next_free_number() {
        let store = SqliteContentStore::in_memory().unwrap();
        let v1 = store.create(&post("Launch", "twitter", "a")).unwrap();
        store.create(&post("Launch", "twitter", "b")).unwrap();
        store.create(&post("Launch", "twitter", "c")).unwrap();

        let next = store
            .update(v1.id, &ContentUpdate::default().with_content_text("d"))
            .unwrap();
        assert_eq!(next.version, 4);
        assert_eq!(latest_in_group(&store, "Launch", "twitter"), vec![next.id]);
    }

    #[test]
    fn test_update_with_new_title_keeps_single_latest_in_target_group() {
        let store = SqliteContentStore::in_memory().unwrap();
        let draft = store.create(&post("Draft", "linkedin", "a")).unwrap();
        let existing = store.create(&post("Final", "linkedin", "b")).unwrap();

        let moved = store
            .update(draft.id, &ContentUpdate::default().with_title("Final"))
            .unwrap();

        assert_eq!(moved.title, "Final");
        assert_eq!(moved.platform, "linkedin");
        assert_eq!(moved.content_text, "a");
        assert_eq!(moved.version, 2);
        assert!(!store.get(existing.id).unwrap().is_latest);
        assert!(!store.get(draft.id).unwrap().is_latest);
        assert_eq!(latest_in_group(&store, "Final", "linkedin"), vec![moved.id]);
    }

    #[test]
    fn test_list_versions_descending_and_not_found() {
        let store = SqliteContentStore::in_memory().unwrap();
        for text in ["a", "b", "c"] {
            store.create(&post("Launch", "threads", text)).unwrap();
        }

        let versions: Vec<u32> = store
            .list_versions("Launch", "threads")
            .unwrap()
            .iter()
            .map(|e| e.version)
            .collect();
        assert_eq!(versions, vec![3, 2, 1]);

        let err = store.list_versions("Launch", "twitter").unwrap_err();
        assert!(matches!(err, QuillError::NotFound { .. }));
    }

    #[test]
    fn test_list_filters_by_date_and_orders_newest_first() {
        let store = SqliteContentStore::in_memory().unwrap();
        let day1 = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 3, 10, 0, 1, 0).unwrap();
        let day2_later = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();

        store.create_at(&post("A", "twitter", "a"), day1).unwrap();
        let b = store.create_at(&post("B", "twitter", "b"), day2).unwrap();
        let c = store.create_at(&post("C", "linkedin", "c"), day2_later).unwrap();

        let on_day2 = store
            .list(&ContentFilter::default().with_date("2024-03-10"))
            .unwrap();
        let ids: Vec<i64> = on_day2.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c.id, b.id]);

        let none = store
            .list(&ContentFilter::default().with_date("2024-03-11"))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_list_rejects_malformed_date() {
        let store = SqliteContentStore::in_memory().unwrap();
        store.create(&post("A", "twitter", "a")).unwrap();

        let err = store
            .list(&ContentFilter::default().with_date("2024/03/10"))
            .unwrap_err();
        assert!(matches!(err, QuillError::Validation { .. }));
    }

    #[test]
    fn test_list_latest_only_versus_all() {
        let store = SqliteContentStore::in_memory().unwrap();
        store.create(&post("A", "twitter", "a1")).unwrap();
        store.create(&post("A", "twitter", "a2")).unwrap();
        store.create(&post("B", "twitter", "b1")).unwrap();

        assert_eq!(store.list(&ContentFilter::default()).unwrap().len(), 2);
        assert_eq!(store.list(&ContentFilter::all_versions()).unwrap().len(), 3);
    }

    #[test]
    fn test_delete_latest_leaves_group_without_latest() {
        let store = SqliteContentStore::in_memory().unwrap();
        let v1 = store.create(&post("A", "twitter", "a1")).unwrap();
        let v2 = store.create(&post("A", "twitter", "a2")).unwrap();

        store.delete(v2.id).unwrap();

        assert!(matches!(
            store.get(v2.id).unwrap_err(),
            QuillError::NotFound { .. }
        ));
        assert!(!store.get(v1.id).unwrap().is_latest);
        assert!(store.list(&ContentFilter::default()).unwrap().is_empty());
        assert!(matches!(
            store.delete(v2.id).unwrap_err(),
            QuillError::NotFound { .. }
        ));
    }

    #[test]
    fn test_deleted_version_numbers_are_not_reused() {
        let store = SqliteContentStore::in_memory().unwrap();
        store.create(&post("A", "twitter", "a1")).unwrap();
        let v2 = store.create(&post("A", "twitter", "a2")).unwrap();
        store.create(&post("A", "twitter", "a3")).unwrap();
        store.delete(v2.id).unwrap();

        let v4 = store.create(&post("A", "twitter", "a4")).unwrap();
        assert_eq!(v4.version, 4);
        assert!(v4.id > v2.id);

        let versions: Vec<u32> = store
            .list_versions("A", "twitter")
            .unwrap()
            .iter()
            .map(|e| e.version)
            .collect();
        assert_eq!(versions, vec![4, 3, 1]);
    }

    #[test]
    fn test_duplicate_version_is_reported_as_conflict() {
        let store = SqliteContentStore::in_memory().unwrap();
        store.create(&post("A", "twitter", "a1")).unwrap();

        let conn = store.conn().unwrap();
        let err: QuillError = conn
            .execute(
                r#"INSERT INTO contents
                   (title, platform, content_type, content_text, version, is_latest, created_at, updated_at)
                   VALUES ('A', 'twitter', 'post', 'dup', 1, 0, 'x', 'x')"#,
                [],
            )
            .unwrap_err()
            .into();
        assert!(err.is_version_conflict());
    }

    #[test]
    fn test_retry_succeeds_after_transient_conflicts() {
        let mut calls = 0;
        let result = with_version_retry(|| {
            calls += 1;
            if calls < MAX_VERSION_ATTEMPTS {
                Err(version_conflict())
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_gives_up_after_bounded_attempts() {
        let mut calls = 0;
        let result: QuillResult<()> = with_version_retry(|| {
            calls += 1;
            Err(version_conflict())
        });

        assert!(result.unwrap_err().is_version_conflict());
        assert_eq!(calls, MAX_VERSION_ATTEMPTS);
    }

    #[test]
    fn test_retry_does_not_repeat_other_errors() {
        let mut calls = 0;
        let result: QuillResult<()> = with_version_retry(|| {
            calls += 1;
            Err(QuillError::database("disk I/O error"))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_platform_filter_matches_non_ascii_platform() {
        let store = SqliteContentStore::in_memory().unwrap();
        let entry = store.create(&post("A", "Ünicode", "a")).unwrap();
        store.create(&post("B", "twitter", "b")).unwrap();

        for needle in ["Ünicode", "ÜNICODE", "nicode"] {
            let hits = store
                .list(&ContentFilter::default().with_platform(needle))
                .unwrap();
            let ids: Vec<i64> = hits.iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![entry.id], "{needle}");
        }
    }
}

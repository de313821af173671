//! SQLite-based storage for categories, trackers, and completion records.
//!
//! `TrackerStore` owns the connection and serializes every operation
//! through it, so callers on multiple threads observe single-writer
//! semantics and consistent read snapshots. Committed mutations are
//! announced on the change feed (see [`crate::events`]).

use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::error::StoreError;
use crate::events::{ChangeEvent, ChangeKind, Subscription, SubscriptionId};
use crate::model::{
    is_palette_color, NewTracker, Schedule, Tracker, TrackerCategory, TrackerRecord,
};
use crate::stats::{self, StatisticsSummary};

/// Calendar-day storage encoding for record dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

// === Helper Functions ===

fn column_uuid(row: &rusqlite::Row, idx: usize) -> Result<Uuid, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn column_date(row: &rusqlite::Row, idx: usize) -> Result<NaiveDate, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn column_datetime(row: &rusqlite::Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Build a Tracker from a `SELECT id, name, emoji, color, schedule,
/// category_id, created_at` row.
fn row_to_tracker(row: &rusqlite::Row) -> Result<Tracker, rusqlite::Error> {
    let schedule_bits: u8 = row.get(4)?;
    Ok(Tracker {
        id: column_uuid(row, 0)?,
        name: row.get(1)?,
        emoji: row.get(2)?,
        color: row.get(3)?,
        schedule: Schedule::from_bits(schedule_bits),
        category_id: column_uuid(row, 5)?,
        created_at: column_datetime(row, 6)?,
    })
}

fn row_to_record(row: &rusqlite::Row) -> Result<TrackerRecord, rusqlite::Error> {
    Ok(TrackerRecord {
        tracker_id: column_uuid(row, 0)?,
        date: column_date(row, 1)?,
    })
}

fn validated_title(title: &str) -> Result<String, StoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::invalid("title", "must not be empty"));
    }
    Ok(title.to_string())
}

fn validate_tracker_fields(name: &str, emoji: &str, color: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::invalid("name", "must not be empty"));
    }
    if emoji.trim().is_empty() {
        return Err(StoreError::invalid("emoji", "must not be empty"));
    }
    if !is_palette_color(color) {
        return Err(StoreError::invalid(
            "color",
            format!("'{color}' is not a palette color"),
        ));
    }
    Ok(())
}

/// SQLite store for the three entity kinds.
///
/// Construct one explicitly and pass it by reference; there is no process
/// global. The connection closes on drop, or explicitly via [`close`].
///
/// [`close`]: TrackerStore::close
pub struct TrackerStore {
    conn: Mutex<Connection>,
    subscribers: Mutex<Vec<(SubscriptionId, Sender<ChangeEvent>)>>,
    next_subscription: AtomicU64,
}

impl TrackerStore {
    /// Open the store at `~/.config/habitlog/habitlog.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("habitlog.db");
        Self::open_at(&path)
    }

    /// Open the store at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store (ephemeral; used by tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        })
    }

    /// Flush and close the underlying connection.
    ///
    /// # Errors
    /// Returns an error if the final commit fails.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close().map_err(|(_, e)| StoreError::Storage(e))
    }

    fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS categories (
                id         TEXT PRIMARY KEY,
                title      TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trackers (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                emoji       TEXT NOT NULL,
                color       TEXT NOT NULL,
                schedule    INTEGER NOT NULL DEFAULT 0,
                category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS records (
                tracker_id TEXT NOT NULL REFERENCES trackers(id) ON DELETE CASCADE,
                date       TEXT NOT NULL,
                PRIMARY KEY (tracker_id, date)
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_title
                ON categories(title COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_trackers_category ON trackers(category_id);
            CREATE INDEX IF NOT EXISTS idx_records_date ON records(date);",
        )?;

        migrations::migrate(conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn subscribers_lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Sender<ChangeEvent>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // === Change feed ===

    /// Register a subscriber for committed-change notifications.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = channel();
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers_lock().push((id, tx));
        Subscription { id, events: rx }
    }

    /// Detach a subscription; its receiver sees no further events.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers_lock().retain(|(sub_id, _)| *sub_id != id);
    }

    /// Deliver one event per affected kind to every live subscriber.
    /// Senders whose receiver is gone are pruned.
    fn notify(&self, kinds: &[ChangeKind]) {
        let at = Utc::now();
        self.subscribers_lock().retain(|(_, tx)| {
            kinds
                .iter()
                .all(|kind| tx.send(ChangeEvent { kind: *kind, at }).is_ok())
        });
    }

    // === Category CRUD ===

    /// Create a category.
    ///
    /// # Errors
    /// `InvalidInput` for an empty title, `DuplicateTitle` if the title
    /// collides case-insensitively with an existing category.
    pub fn create_category(&self, title: &str) -> Result<TrackerCategory, StoreError> {
        let title = validated_title(title)?;
        let category = TrackerCategory {
            id: Uuid::new_v4(),
            title,
            trackers: Vec::new(),
            created_at: Utc::now(),
        };

        {
            let conn = self.lock();
            if Self::category_title_taken(&conn, &category.title, None)? {
                return Err(StoreError::DuplicateTitle(category.title));
            }
            conn.execute(
                "INSERT INTO categories (id, title, created_at) VALUES (?1, ?2, ?3)",
                params![
                    category.id.to_string(),
                    category.title,
                    category.created_at.to_rfc3339(),
                ],
            )?;
        }

        self.notify(&[ChangeKind::Category]);
        Ok(category)
    }

    /// Rename a category, keeping the case-insensitive uniqueness rule.
    ///
    /// # Errors
    /// `CategoryNotFound`, `DuplicateTitle`, or `InvalidInput`.
    pub fn rename_category(&self, id: Uuid, new_title: &str) -> Result<(), StoreError> {
        let new_title = validated_title(new_title)?;

        {
            let conn = self.lock();
            if !Self::category_exists(&conn, id)? {
                return Err(StoreError::CategoryNotFound(id));
            }
            if Self::category_title_taken(&conn, &new_title, Some(id))? {
                return Err(StoreError::DuplicateTitle(new_title));
            }
            conn.execute(
                "UPDATE categories SET title = ?1 WHERE id = ?2",
                params![new_title, id.to_string()],
            )?;
        }

        self.notify(&[ChangeKind::Category]);
        Ok(())
    }

    /// Delete a category. Its trackers and their records are deleted with it.
    ///
    /// # Errors
    /// `CategoryNotFound` if no category has this id.
    pub fn delete_category(&self, id: Uuid) -> Result<(), StoreError> {
        let mut kinds = vec![ChangeKind::Category];

        {
            let conn = self.lock();
            let tracker_count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM trackers WHERE category_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )?;
            let record_count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM records WHERE tracker_id IN
                     (SELECT id FROM trackers WHERE category_id = ?1)",
                params![id.to_string()],
                |row| row.get(0),
            )?;

            let deleted = conn.execute(
                "DELETE FROM categories WHERE id = ?1",
                params![id.to_string()],
            )?;
            if deleted == 0 {
                return Err(StoreError::CategoryNotFound(id));
            }

            if tracker_count > 0 {
                kinds.push(ChangeKind::Tracker);
            }
            if record_count > 0 {
                kinds.push(ChangeKind::Record);
            }
        }

        self.notify(&kinds);
        Ok(())
    }

    /// Categories in canonical order with their trackers populated.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_categories(&self) -> Result<Vec<TrackerCategory>, StoreError> {
        let conn = self.lock();
        Ok(Self::query_categories(&conn)?)
    }

    fn category_exists(conn: &Connection, id: Uuid) -> Result<bool, rusqlite::Error> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn category_title_taken(
        conn: &Connection,
        title: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, rusqlite::Error> {
        let count: i64 = match exclude {
            Some(id) => conn.query_row(
                "SELECT COUNT(*) FROM categories WHERE title = ?1 COLLATE NOCASE AND id != ?2",
                params![title, id.to_string()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM categories WHERE title = ?1 COLLATE NOCASE",
                params![title],
                |row| row.get(0),
            )?,
        };
        Ok(count > 0)
    }

    fn query_categories(conn: &Connection) -> Result<Vec<TrackerCategory>, rusqlite::Error> {
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at FROM categories
             ORDER BY title COLLATE NOCASE ASC, id ASC",
        )?;
        let mut categories: Vec<TrackerCategory> = stmt
            .query_map([], |row| {
                Ok(TrackerCategory {
                    id: column_uuid(row, 0)?,
                    title: row.get(1)?,
                    trackers: Vec::new(),
                    created_at: column_datetime(row, 2)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, emoji, color, schedule, category_id, created_at FROM trackers
             ORDER BY name COLLATE NOCASE ASC, id ASC",
        )?;
        let trackers: Vec<Tracker> = stmt
            .query_map([], row_to_tracker)?
            .collect::<Result<_, _>>()?;

        let mut by_category: HashMap<Uuid, Vec<Tracker>> = HashMap::new();
        for tracker in trackers {
            by_category
                .entry(tracker.category_id)
                .or_default()
                .push(tracker);
        }
        for category in &mut categories {
            if let Some(owned) = by_category.remove(&category.id) {
                category.trackers = owned;
            }
        }
        Ok(categories)
    }

    // === Tracker CRUD ===

    /// Create a tracker in an existing category.
    ///
    /// The schedule may be empty (the creation flow fills it in later); an
    /// empty-schedule tracker is simply never due.
    ///
    /// # Errors
    /// `InvalidInput` for empty name/emoji or a non-palette color,
    /// `CategoryNotFound` if the target category does not exist.
    pub fn create_tracker(&self, new: &NewTracker) -> Result<Tracker, StoreError> {
        validate_tracker_fields(&new.name, &new.emoji, &new.color)?;
        let tracker = Tracker {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            emoji: new.emoji.trim().to_string(),
            color: new.color.clone(),
            schedule: new.schedule,
            category_id: new.category_id,
            created_at: Utc::now(),
        };

        {
            let conn = self.lock();
            if !Self::category_exists(&conn, new.category_id)? {
                return Err(StoreError::CategoryNotFound(new.category_id));
            }
            conn.execute(
                "INSERT INTO trackers (id, name, emoji, color, schedule, category_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    tracker.id.to_string(),
                    tracker.name,
                    tracker.emoji,
                    tracker.color,
                    tracker.schedule.bits(),
                    tracker.category_id.to_string(),
                    tracker.created_at.to_rfc3339(),
                ],
            )?;
        }

        self.notify(&[ChangeKind::Tracker]);
        Ok(tracker)
    }

    /// Get a tracker by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_tracker(&self, id: Uuid) -> Result<Option<Tracker>, StoreError> {
        let conn = self.lock();
        let tracker = conn
            .query_row(
                "SELECT id, name, emoji, color, schedule, category_id, created_at
                 FROM trackers WHERE id = ?1",
                params![id.to_string()],
                row_to_tracker,
            )
            .optional()?;
        Ok(tracker)
    }

    /// Update an existing tracker. Any field may change, including the
    /// owning category.
    ///
    /// # Errors
    /// `TrackerNotFound`, `CategoryNotFound` for the target category, or
    /// `InvalidInput`.
    pub fn update_tracker(&self, tracker: &Tracker) -> Result<(), StoreError> {
        validate_tracker_fields(&tracker.name, &tracker.emoji, &tracker.color)?;

        {
            let conn = self.lock();
            if !Self::category_exists(&conn, tracker.category_id)? {
                return Err(StoreError::CategoryNotFound(tracker.category_id));
            }
            let updated = conn.execute(
                "UPDATE trackers
                 SET name = ?1, emoji = ?2, color = ?3, schedule = ?4, category_id = ?5
                 WHERE id = ?6",
                params![
                    tracker.name.trim(),
                    tracker.emoji.trim(),
                    tracker.color,
                    tracker.schedule.bits(),
                    tracker.category_id.to_string(),
                    tracker.id.to_string(),
                ],
            )?;
            if updated == 0 {
                return Err(StoreError::TrackerNotFound(tracker.id));
            }
        }

        self.notify(&[ChangeKind::Tracker]);
        Ok(())
    }

    /// Delete a tracker and all of its completion records.
    ///
    /// # Errors
    /// `TrackerNotFound` if no tracker has this id.
    pub fn delete_tracker(&self, id: Uuid) -> Result<(), StoreError> {
        let mut kinds = vec![ChangeKind::Tracker];

        {
            let conn = self.lock();
            let record_count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM records WHERE tracker_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )?;
            let deleted = conn.execute(
                "DELETE FROM trackers WHERE id = ?1",
                params![id.to_string()],
            )?;
            if deleted == 0 {
                return Err(StoreError::TrackerNotFound(id));
            }
            if record_count > 0 {
                kinds.push(ChangeKind::Record);
            }
        }

        self.notify(&kinds);
        Ok(())
    }

    /// Trackers in canonical order, optionally restricted to one category.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_trackers(&self, category_id: Option<Uuid>) -> Result<Vec<Tracker>, StoreError> {
        let conn = self.lock();
        let trackers = match category_id {
            Some(category_id) => {
                let mut stmt = conn.prepare(
                    "SELECT id, name, emoji, color, schedule, category_id, created_at
                     FROM trackers WHERE category_id = ?1
                     ORDER BY name COLLATE NOCASE ASC, id ASC",
                )?;
                let trackers = stmt
                    .query_map(params![category_id.to_string()], row_to_tracker)?
                    .collect::<Result<Vec<_>, _>>()?;
                trackers
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, name, emoji, color, schedule, category_id, created_at
                     FROM trackers ORDER BY name COLLATE NOCASE ASC, id ASC",
                )?;
                let trackers = stmt
                    .query_map([], row_to_tracker)?
                    .collect::<Result<Vec<_>, _>>()?;
                trackers
            }
        };
        Ok(trackers)
    }

    fn tracker_exists(conn: &Connection, id: Uuid) -> Result<bool, rusqlite::Error> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM trackers WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // === Completion ledger ===

    /// Flip the completion state of a tracker for a calendar day.
    ///
    /// Inserting when absent, removing when present; the (tracker, day)
    /// primary key keeps the ledger at one record per day. Returns the new
    /// state.
    ///
    /// # Errors
    /// `TrackerNotFound`, or `FutureDate` when `date` is after today on the
    /// local calendar.
    pub fn toggle_completion(&self, tracker_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        let today = Local::now().date_naive();
        if date > today {
            return Err(StoreError::FutureDate(date));
        }

        let completed;
        {
            let conn = self.lock();
            if !Self::tracker_exists(&conn, tracker_id)? {
                return Err(StoreError::TrackerNotFound(tracker_id));
            }
            let date_str = date.format(DATE_FORMAT).to_string();
            let removed = conn.execute(
                "DELETE FROM records WHERE tracker_id = ?1 AND date = ?2",
                params![tracker_id.to_string(), date_str],
            )?;
            completed = removed == 0;
            if completed {
                conn.execute(
                    "INSERT INTO records (tracker_id, date) VALUES (?1, ?2)",
                    params![tracker_id.to_string(), date_str],
                )?;
            }
        }

        self.notify(&[ChangeKind::Record]);
        Ok(completed)
    }

    /// Whether the tracker is completed on the given day.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn is_completed(&self, tracker_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE tracker_id = ?1 AND date = ?2",
            params![
                tracker_id.to_string(),
                date.format(DATE_FORMAT).to_string()
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All-time completion count for a tracker.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn completion_count(&self, tracker_id: Uuid) -> Result<u64, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE tracker_id = ?1",
            params![tracker_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Completion records ordered by day, optionally for one tracker.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_completions(
        &self,
        tracker_id: Option<Uuid>,
    ) -> Result<Vec<TrackerRecord>, StoreError> {
        let conn = self.lock();
        Ok(Self::query_records(&conn, tracker_id)?)
    }

    fn query_records(
        conn: &Connection,
        tracker_id: Option<Uuid>,
    ) -> Result<Vec<TrackerRecord>, rusqlite::Error> {
        match tracker_id {
            Some(tracker_id) => {
                let mut stmt = conn.prepare(
                    "SELECT tracker_id, date FROM records WHERE tracker_id = ?1
                     ORDER BY date ASC, tracker_id ASC",
                )?;
                let records = stmt
                    .query_map(params![tracker_id.to_string()], row_to_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT tracker_id, date FROM records ORDER BY date ASC, tracker_id ASC",
                )?;
                let records = stmt
                    .query_map([], row_to_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            }
        }
    }

    // === Statistics ===

    /// Summary statistics over a consistent snapshot of the store.
    ///
    /// # Errors
    /// Returns an error if the snapshot queries fail.
    pub fn statistics(&self) -> Result<StatisticsSummary, StoreError> {
        let conn = self.lock();
        let categories = Self::query_categories(&conn)?;
        let records = Self::query_records(&conn, None)?;
        Ok(stats::summarize(&categories, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday;
    use proptest::prelude::*;
    use std::sync::mpsc::TryRecvError;

    fn store() -> TrackerStore {
        TrackerStore::open_memory().unwrap()
    }

    fn new_tracker(name: &str, schedule: Schedule, category_id: Uuid) -> NewTracker {
        NewTracker {
            name: name.to_string(),
            emoji: "🏃".to_string(),
            color: "CollectionColor2".to_string(),
            schedule,
            category_id,
        }
    }

    // 2024-01-01 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn category_titles_are_unique_case_insensitively() {
        let store = store();
        store.create_category("Sport").unwrap();
        let err = store.create_category("sport").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTitle(title) if title == "sport"));
    }

    #[test]
    fn category_title_must_not_be_blank() {
        let store = store();
        let err = store.create_category("   ").unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput { field: "title", .. }));
    }

    #[test]
    fn rename_checks_collisions_but_allows_case_change_of_self() {
        let store = store();
        let health = store.create_category("Health").unwrap();
        store.create_category("Work").unwrap();

        let err = store.rename_category(health.id, "WORK").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTitle(_)));

        // Changing only the casing of the category's own title is allowed.
        store.rename_category(health.id, "HEALTH").unwrap();
        let titles: Vec<String> = store
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["HEALTH".to_string(), "Work".to_string()]);
    }

    #[test]
    fn rename_missing_category_fails() {
        let store = store();
        let err = store.rename_category(Uuid::new_v4(), "Anything").unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(_)));
    }

    #[test]
    fn categories_sort_alphabetically_ignoring_case() {
        let store = store();
        store.create_category("work").unwrap();
        store.create_category("Art").unwrap();
        store.create_category("health").unwrap();

        let titles: Vec<String> = store
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Art", "health", "work"]);
    }

    #[test]
    fn tracker_requires_existing_category() {
        let store = store();
        let err = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(_)));
    }

    #[test]
    fn tracker_rejects_empty_name_and_unknown_color() {
        let store = store();
        let category = store.create_category("Health").unwrap();

        let err = store
            .create_tracker(&new_tracker("  ", Schedule::EVERY_DAY, category.id))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput { field: "name", .. }));

        let mut bad_color = new_tracker("Run", Schedule::EVERY_DAY, category.id);
        bad_color.color = "Magenta".to_string();
        let err = store.create_tracker(&bad_color).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput { field: "color", .. }));
    }

    #[test]
    fn tracker_round_trip_preserves_schedule() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let schedule = Schedule::from_days([Weekday::Monday, Weekday::Friday]);
        let created = store
            .create_tracker(&new_tracker("Run", schedule, category.id))
            .unwrap();

        let fetched = store.get_tracker(created.id).unwrap().unwrap();
        assert_eq!(fetched.schedule, schedule);
        assert_eq!(fetched.name, "Run");
        assert_eq!(fetched.category_id, category.id);
    }

    #[test]
    fn update_moves_tracker_between_categories() {
        let store = store();
        let health = store.create_category("Health").unwrap();
        let work = store.create_category("Work").unwrap();
        let mut tracker = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, health.id))
            .unwrap();

        tracker.category_id = work.id;
        tracker.name = "Walk".to_string();
        store.update_tracker(&tracker).unwrap();

        assert!(store.list_trackers(Some(health.id)).unwrap().is_empty());
        let moved = store.list_trackers(Some(work.id)).unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].name, "Walk");
    }

    #[test]
    fn update_missing_tracker_fails() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let tracker = Tracker {
            id: Uuid::new_v4(),
            name: "Ghost".to_string(),
            emoji: "👻".to_string(),
            color: "CollectionColor1".to_string(),
            schedule: Schedule::EVERY_DAY,
            category_id: category.id,
            created_at: Utc::now(),
        };
        let err = store.update_tracker(&tracker).unwrap_err();
        assert!(matches!(err, StoreError::TrackerNotFound(_)));
    }

    #[test]
    fn toggle_flips_state_and_keeps_one_record_per_day() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let tracker = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, category.id))
            .unwrap();

        assert!(store.toggle_completion(tracker.id, monday()).unwrap());
        assert!(store.is_completed(tracker.id, monday()).unwrap());
        assert_eq!(store.completion_count(tracker.id).unwrap(), 1);

        assert!(!store.toggle_completion(tracker.id, monday()).unwrap());
        assert!(!store.is_completed(tracker.id, monday()).unwrap());
        assert_eq!(store.completion_count(tracker.id).unwrap(), 0);
    }

    #[test]
    fn toggle_rejects_future_dates() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let tracker = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, category.id))
            .unwrap();

        let tomorrow = Local::now().date_naive() + chrono::Days::new(1);
        let err = store.toggle_completion(tracker.id, tomorrow).unwrap_err();
        assert!(matches!(err, StoreError::FutureDate(_)));
        assert_eq!(store.completion_count(tracker.id).unwrap(), 0);
    }

    #[test]
    fn toggle_unknown_tracker_fails() {
        let store = store();
        let err = store
            .toggle_completion(Uuid::new_v4(), monday())
            .unwrap_err();
        assert!(matches!(err, StoreError::TrackerNotFound(_)));
    }

    #[test]
    fn deleting_tracker_cascades_records() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let tracker = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, category.id))
            .unwrap();
        store.toggle_completion(tracker.id, monday()).unwrap();

        store.delete_tracker(tracker.id).unwrap();
        assert!(store.get_tracker(tracker.id).unwrap().is_none());
        assert!(store.list_completions(Some(tracker.id)).unwrap().is_empty());
    }

    #[test]
    fn deleting_category_cascades_trackers_and_records() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let tracker = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, category.id))
            .unwrap();
        store.toggle_completion(tracker.id, monday()).unwrap();

        store.delete_category(category.id).unwrap();
        assert!(store.list_categories().unwrap().is_empty());
        assert!(store.list_trackers(None).unwrap().is_empty());
        assert!(store.list_completions(None).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_entities_fail() {
        let store = store();
        assert!(matches!(
            store.delete_category(Uuid::new_v4()).unwrap_err(),
            StoreError::CategoryNotFound(_)
        ));
        assert!(matches!(
            store.delete_tracker(Uuid::new_v4()).unwrap_err(),
            StoreError::TrackerNotFound(_)
        ));
    }

    #[test]
    fn subscribers_get_one_event_per_committed_change() {
        let store = store();
        let first = store.subscribe();
        let second = store.subscribe();

        let category = store.create_category("Health").unwrap();

        for subscription in [&first, &second] {
            let event = subscription.events.try_recv().unwrap();
            assert_eq!(event.kind, ChangeKind::Category);
            assert!(matches!(
                subscription.events.try_recv(),
                Err(TryRecvError::Empty)
            ));
        }

        let tracker = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, category.id))
            .unwrap();
        store.toggle_completion(tracker.id, monday()).unwrap();

        let kinds: Vec<ChangeKind> = first.events.try_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Tracker, ChangeKind::Record]);
    }

    #[test]
    fn cascade_delete_notifies_every_affected_kind() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let tracker = store
            .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, category.id))
            .unwrap();
        store.toggle_completion(tracker.id, monday()).unwrap();

        let subscription = store.subscribe();
        store.delete_category(category.id).unwrap();

        let kinds: Vec<ChangeKind> = subscription.events.try_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Category, ChangeKind::Tracker, ChangeKind::Record]
        );
    }

    #[test]
    fn unsubscribed_handles_receive_nothing() {
        let store = store();
        let subscription = store.subscribe();
        store.unsubscribe(subscription.id);

        store.create_category("Health").unwrap();
        assert!(matches!(
            subscription.events.try_recv(),
            Err(TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn dropped_receiver_does_not_fail_mutations() {
        let store = store();
        let subscription = store.subscribe();
        drop(subscription.events);

        store.create_category("Health").unwrap();
        store.create_category("Work").unwrap();
        assert_eq!(store.list_categories().unwrap().len(), 2);
    }

    #[test]
    fn failed_mutations_notify_nobody() {
        let store = store();
        store.create_category("Health").unwrap();
        let subscription = store.subscribe();

        let _ = store.create_category("health").unwrap_err();
        assert!(matches!(
            subscription.events.try_recv(),
            Err(TryRecvError::Empty)
        ));
    }

    #[test]
    fn statistics_over_store_snapshot() {
        let store = store();
        let category = store.create_category("Health").unwrap();
        let tracker = store
            .create_tracker(&new_tracker(
                "Run",
                Schedule::from_days([Weekday::Monday]),
                category.id,
            ))
            .unwrap();
        store.toggle_completion(tracker.id, monday()).unwrap();

        let summary = store.statistics().unwrap();
        assert_eq!(summary.completed_trackers, 1);
        assert_eq!(summary.ideal_days, 1);
        assert_eq!(summary.best_period, 1);
        assert!((summary.average_value - 1.0).abs() < f64::EPSILON);
    }

    proptest! {
        // Any toggle sequence leaves each day with at most one record, and
        // record presence equals the parity of toggles on that day.
        #[test]
        fn toggle_sequences_preserve_ledger_invariants(
            flips in proptest::collection::vec(0usize..4, 1..40)
        ) {
            let store = store();
            let category = store.create_category("Health").unwrap();
            let tracker = store
                .create_tracker(&new_tracker("Run", Schedule::EVERY_DAY, category.id))
                .unwrap();

            let days: Vec<NaiveDate> = (0..4)
                .map(|offset| monday() + chrono::Days::new(offset))
                .collect();
            let mut toggle_counts = [0usize; 4];

            for &day_index in &flips {
                store.toggle_completion(tracker.id, days[day_index]).unwrap();
                toggle_counts[day_index] += 1;
            }

            let records = store.list_completions(Some(tracker.id)).unwrap();
            let mut seen_days = std::collections::HashSet::new();
            for record in &records {
                prop_assert!(seen_days.insert(record.date));
            }
            for (day_index, day) in days.iter().enumerate() {
                let expected = toggle_counts[day_index] % 2 == 1;
                prop_assert_eq!(store.is_completed(tracker.id, *day).unwrap(), expected);
            }
        }
    }
}

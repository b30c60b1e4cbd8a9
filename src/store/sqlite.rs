//! `SQLite`-backed [`BookStore`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use super::{
    BookStore, Collection, LockAttempt, PreferenceUpdate, QueueDocument, Result, ShortlistedAuthor,
    StoreError, StoreEvent, StoredBook, UserProfile,
};
use crate::db::Database;

/// Buffered creation events per subscriber before the oldest are dropped.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Timestamp format shared with the schema's `strftime` defaults so text ordering is chronological.
pub(crate) fn store_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Profile and book-collection store backed by `SQLite`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteStore {
    /// Creates a store over an already-migrated database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { db, events }
    }

    fn publish(&self, user_id: &str, doc_id: &str, collection: Collection) {
        let event = StoreEvent::BookCreated {
            user_id: user_id.to_string(),
            doc_id: doc_id.to_string(),
            collection,
        };
        if self.events.send(event).is_err() {
            debug!(user_id, doc_id, %collection, "no event subscribers");
        }
    }
}

fn decode_json_list<T: serde::de::DeserializeOwned>(user_id: &str, raw: &str) -> Result<Vec<T>> {
    serde_json::from_str(raw).map_err(|e| StoreError::serialization(user_id, &e))
}

fn encode_json<T: serde::Serialize + ?Sized>(user_id: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| StoreError::serialization(user_id, &e))
}

fn profile_from_row(row: &SqliteRow) -> Result<UserProfile> {
    let id: String = row.try_get("id")?;
    let subject_keywords: String = row.try_get("subject_keywords")?;
    let fetched_subjects: String = row.try_get("fetched_subjects")?;
    let shortlisted_authors: String = row.try_get("shortlisted_authors")?;
    let is_updating: i64 = row.try_get("is_updating")?;

    Ok(UserProfile {
        subject_keywords: decode_json_list(&id, &subject_keywords)?,
        fetched_subjects: decode_json_list(&id, &fetched_subjects)?,
        shortlisted_authors: decode_json_list::<ShortlistedAuthor>(&id, &shortlisted_authors)?,
        current_index: row.try_get("current_index")?,
        is_updating: is_updating != 0,
        favourite_publishing_period: row.try_get("favourite_publishing_period")?,
        created_at: row.try_get("created_at")?,
        id,
    })
}

fn book_from_row(user_id: &str, row: &SqliteRow) -> Result<StoredBook> {
    let collection: String = row.try_get("collection")?;
    let data: String = row.try_get("data")?;
    Ok(StoredBook {
        doc_id: row.try_get("doc_id")?,
        work_key: row.try_get("work_key")?,
        collection: collection.parse().map_err(|message| StoreError::Serialization {
            user_id: user_id.to_string(),
            message,
        })?,
        data: serde_json::from_str(&data).map_err(|e| StoreError::serialization(user_id, &e))?,
        created_at: row.try_get("created_at")?,
    })
}

fn describe_collections(collections: &[Collection]) -> String {
    collections
        .iter()
        .map(Collection::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

#[async_trait]
impl BookStore for SqliteStore {
    #[instrument(skip(self))]
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn create_profile(&self, user_id: &str) -> Result<UserProfile> {
        sqlx::query("INSERT INTO users (id) VALUES (?) ON CONFLICT(id) DO NOTHING")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        self.get_profile(user_id)
            .await?
            .ok_or_else(|| StoreError::ProfileNotFound(user_id.to_string()))
    }

    #[instrument(skip(self))]
    async fn try_begin_update(&self, user_id: &str) -> Result<LockAttempt> {
        // Single conditional UPDATE ... RETURNING: no window between check and set.
        let row = sqlx::query(
            r"UPDATE users
              SET is_updating = 1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
              WHERE id = ? AND is_updating = 0
              RETURNING *",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        if let Some(row) = row {
            return Ok(LockAttempt::Acquired(profile_from_row(&row)?));
        }

        let exists = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?
            .is_some();
        Ok(if exists {
            LockAttempt::AlreadyUpdating
        } else {
            LockAttempt::ProfileMissing
        })
    }

    #[instrument(skip(self))]
    async fn finish_update(&self, user_id: &str, written: u64) -> Result<()> {
        let advance = i64::try_from(written).unwrap_or(i64::MAX);
        let result = sqlx::query(
            r"UPDATE users
              SET is_updating = 0,
                  current_index = current_index + ?,
                  updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
              WHERE id = ?",
        )
        .bind(advance)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProfileNotFound(user_id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, update), fields(keywords = update.subject_keywords.len()))]
    async fn update_preferences(&self, user_id: &str, update: &PreferenceUpdate) -> Result<()> {
        let keywords = encode_json(user_id, &update.subject_keywords)?;
        let authors = encode_json(user_id, &update.shortlisted_authors)?;
        let result = sqlx::query(
            r"UPDATE users
              SET subject_keywords = ?,
                  favourite_publishing_period = COALESCE(?, favourite_publishing_period),
                  shortlisted_authors = ?,
                  updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
              WHERE id = ?",
        )
        .bind(keywords)
        .bind(update.favourite_publishing_period.as_deref())
        .bind(authors)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProfileNotFound(user_id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, subjects), fields(count = subjects.len()))]
    async fn add_fetched_subjects(&self, user_id: &str, subjects: &[String]) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        let raw: Option<String> =
            sqlx::query_scalar("SELECT fetched_subjects FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(raw) = raw else {
            return Err(StoreError::ProfileNotFound(user_id.to_string()));
        };

        let mut merged: Vec<String> = decode_json_list(user_id, &raw)?;
        for subject in subjects {
            if !merged.contains(subject) {
                merged.push(subject.clone());
            }
        }

        sqlx::query("UPDATE users SET fetched_subjects = ? WHERE id = ?")
            .bind(encode_json(user_id, &merged)?)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn known_book_keys(&self, user_id: &str) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT doc_id, work_key FROM books WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        let mut keys = HashSet::with_capacity(rows.len() * 2);
        for row in rows {
            keys.insert(row.try_get::<String, _>("doc_id")?);
            if let Some(work_key) = row.try_get::<Option<String>, _>("work_key")? {
                keys.insert(work_key);
            }
        }
        Ok(keys)
    }

    #[instrument(skip(self, documents), fields(batch = documents.len()))]
    async fn write_queue_batch(&self, user_id: &str, documents: &[QueueDocument]) -> Result<u64> {
        if documents.is_empty() {
            return Ok(0);
        }

        let batch_timestamp = store_timestamp();
        let mut tx = self.db.pool().begin().await?;
        for document in documents {
            let body = encode_json(user_id, document.record.as_map())?;
            // The row shares the allocation stamp when the record carries one.
            let created_at = document
                .record
                .get("createdAt")
                .and_then(Value::as_str)
                .unwrap_or(batch_timestamp.as_str());
            sqlx::query(
                r"INSERT INTO books (user_id, doc_id, collection, work_key, data, created_at)
                  VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(&document.doc_id)
            .bind(Collection::Queue.as_str())
            .bind(&document.work_key)
            .bind(body)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }
        // Dropping `tx` on any error above rolls the whole batch back.
        tx.commit().await?;

        for document in documents {
            self.publish(user_id, &document.doc_id, Collection::Queue);
        }
        Ok(documents.len() as u64)
    }

    #[instrument(skip(self, from))]
    async fn move_book(
        &self,
        user_id: &str,
        doc_id: &str,
        from: &[Collection],
        to: Collection,
    ) -> Result<StoredBook> {
        let mut tx = self.db.pool().begin().await?;
        let row = sqlx::query("SELECT * FROM books WHERE user_id = ? AND doc_id = ?")
            .bind(user_id)
            .bind(doc_id)
            .fetch_optional(&mut *tx)
            .await?;

        let existing = row.as_ref().map(|r| book_from_row(user_id, r)).transpose()?;
        let Some(existing) = existing.filter(|book| from.contains(&book.collection)) else {
            return Err(StoreError::BookNotFound {
                user_id: user_id.to_string(),
                doc_id: doc_id.to_string(),
                expected: describe_collections(from),
            });
        };

        // Delete + insert so the moved document gets a fresh creation time and row order.
        sqlx::query("DELETE FROM books WHERE user_id = ? AND doc_id = ?")
            .bind(user_id)
            .bind(doc_id)
            .execute(&mut *tx)
            .await?;

        let created_at = store_timestamp();
        sqlx::query(
            r"INSERT INTO books (user_id, doc_id, collection, work_key, data, created_at)
              VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(doc_id)
        .bind(to.as_str())
        .bind(existing.work_key.as_deref())
        .bind(encode_json(user_id, &existing.data)?)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.publish(user_id, doc_id, to);
        Ok(StoredBook {
            collection: to,
            created_at,
            ..existing
        })
    }

    #[instrument(skip(self))]
    async fn recent_books(
        &self,
        user_id: &str,
        collection: Collection,
        limit: u32,
    ) -> Result<Vec<StoredBook>> {
        let rows = sqlx::query(
            r"SELECT * FROM books
              WHERE user_id = ? AND collection = ?
              ORDER BY created_at DESC, id DESC
              LIMIT ?",
        )
        .bind(user_id)
        .bind(collection.as_str())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(|row| book_from_row(user_id, row)).collect()
    }

    #[instrument(skip(self))]
    async fn count_books(&self, user_id: &str, collection: Collection) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE user_id = ? AND collection = ?")
                .bind(user_id)
                .bind(collection.as_str())
                .fetch_one(self.db.pool())
                .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

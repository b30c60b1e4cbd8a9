//! Document store for user profiles and their book collections.
//!
//! # Overview
//!
//! - [`BookStore`] - Async data-access contract used by the pipeline, profiler and swipe handlers
//! - [`SqliteStore`] - `SQLite`-backed implementation with creation-event notifications
//! - [`UserProfile`] - Preference state plus the advisory `is_updating` lock
//! - [`Collection`] - Queue, liked and disliked sets
//! - [`Document`] / [`SanitizedRecord`] - Loose values before and after sanitization

mod document;
mod error;
mod model;
mod sqlite;

pub use document::{DocValue, Document, RESERVED_KEY_PREFIX, SanitizedRecord};
pub use error::{StoreDbErrorKind, StoreError};
pub use model::{
    Collection, LockAttempt, PreferenceUpdate, QueueDocument, ShortlistedAuthor, StoreEvent,
    StoredBook, UserProfile,
};
pub use sqlite::SqliteStore;
pub(crate) use sqlite::store_timestamp;

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::broadcast;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Data-access contract for profiles and book collections.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Reads a profile.
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Creates an empty profile if none exists and returns the stored profile.
    async fn create_profile(&self, user_id: &str) -> Result<UserProfile>;

    /// Sets `is_updating` only if it is currently false, in one atomic statement.
    async fn try_begin_update(&self, user_id: &str) -> Result<LockAttempt>;

    /// Clears `is_updating` and advances `current_index` by `written`.
    async fn finish_update(&self, user_id: &str, written: u64) -> Result<()>;

    /// Applies derived preference fields in a single update.
    async fn update_preferences(&self, user_id: &str, update: &PreferenceUpdate) -> Result<()>;

    /// Adds subjects to the profile's explored-subject set.
    async fn add_fetched_subjects(&self, user_id: &str, subjects: &[String]) -> Result<()>;

    /// Returns every document id and work key across queue, liked and disliked.
    async fn known_book_keys(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Writes all documents into the queue atomically; returns the count written.
    async fn write_queue_batch(&self, user_id: &str, documents: &[QueueDocument]) -> Result<u64>;

    /// Moves a document from one of `from` into `to`.
    ///
    /// Fails with [`StoreError::BookNotFound`] when the document is in none of `from`.
    async fn move_book(
        &self,
        user_id: &str,
        doc_id: &str,
        from: &[Collection],
        to: Collection,
    ) -> Result<StoredBook>;

    /// Returns up to `limit` documents of a collection, newest first.
    async fn recent_books(
        &self,
        user_id: &str,
        collection: Collection,
        limit: u32,
    ) -> Result<Vec<StoredBook>>;

    /// Counts documents in a collection.
    async fn count_books(&self, user_id: &str, collection: Collection) -> Result<u64>;

    /// Subscribes to document-creation notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

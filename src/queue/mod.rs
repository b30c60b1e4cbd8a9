//! Queue state control.
//!
//! Owns the per-user advisory lock and the monotonic ordering counter. A run
//! takes the lock with a conditional update, shuffles its batch, numbers it
//! from the profile's `current_index`, writes it atomically, and releases the
//! lock while advancing the counter by the number written.
//!
//! # Overview
//!
//! - [`QueueStateController`] - Lock, persist and release against a [`BookStore`]
//! - [`allocate`] - Uniform shuffle plus `index`/`createdAt` stamping

mod allocation;

pub use allocation::allocate;

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::store::{self, BookStore, LockAttempt, QueueDocument};

/// Lock and counter operations for one user's queue.
pub struct QueueStateController {
    store: Arc<dyn BookStore>,
}

impl QueueStateController {
    #[must_use]
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Idle → running. Never blocks: a held lock reports [`LockAttempt::AlreadyUpdating`].
    ///
    /// # Errors
    ///
    /// Returns a store error when the conditional update fails.
    #[instrument(skip(self))]
    pub async fn begin(&self, user_id: &str) -> store::Result<LockAttempt> {
        let attempt = self.store.try_begin_update(user_id).await?;
        debug!(acquired = matches!(attempt, LockAttempt::Acquired(_)), "Lock attempt");
        Ok(attempt)
    }

    /// Shuffles and numbers a batch starting at `current_index`.
    #[must_use]
    pub fn prepare(&self, documents: Vec<QueueDocument>, current_index: i64) -> Vec<QueueDocument> {
        let created_at = store::store_timestamp();
        allocate(documents, current_index, &created_at, &mut rand::thread_rng())
    }

    /// Writes the batch in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a store error when the transaction fails; nothing is written then.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn persist(&self, user_id: &str, documents: &[QueueDocument]) -> store::Result<u64> {
        if documents.is_empty() {
            return Ok(0);
        }
        self.store.write_queue_batch(user_id, documents).await
    }

    /// Running → idle, advancing the counter by `written`.
    ///
    /// # Errors
    ///
    /// Returns a store error when the release update fails.
    #[instrument(skip(self))]
    pub async fn finish(&self, user_id: &str, written: u64) -> store::Result<()> {
        self.store.finish_update(user_id, written).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::enrich::sanitize_document;
    use crate::store::{Collection, DocValue, Document, RESERVED_KEY_PREFIX};
    use crate::test_support::store_with_profile;

    fn doc(doc_id: &str) -> QueueDocument {
        let mut fields = Document::new();
        fields.insert("title".to_string(), DocValue::from(doc_id));
        QueueDocument {
            doc_id: doc_id.to_string(),
            work_key: format!("/works/{doc_id}"),
            record: sanitize_document(fields, RESERVED_KEY_PREFIX),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_advances_counter_by_written() {
        let store = Arc::new(store_with_profile("reader").await);
        let controller = QueueStateController::new(store.clone());

        let LockAttempt::Acquired(profile) = controller.begin("reader").await.unwrap() else {
            panic!("expected lock");
        };
        let batch = controller.prepare(vec![doc("OL1W"), doc("OL2W"), doc("OL3W")], profile.current_index);
        let written = controller.persist("reader", &batch).await.unwrap();
        controller.finish("reader", written).await.unwrap();

        let profile = store.get_profile("reader").await.unwrap().unwrap();
        assert_eq!(profile.current_index, 3);
        assert!(!profile.is_updating);
        assert_eq!(store.count_books("reader", Collection::Queue).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_second_begin_while_running_is_rejected() {
        let store = Arc::new(store_with_profile("reader").await);
        let controller = QueueStateController::new(store);
        assert!(matches!(controller.begin("reader").await.unwrap(), LockAttempt::Acquired(_)));
        assert_eq!(controller.begin("reader").await.unwrap(), LockAttempt::AlreadyUpdating);
    }

    #[tokio::test]
    async fn test_persist_empty_batch_writes_nothing() {
        let store = Arc::new(store_with_profile("reader").await);
        let controller = QueueStateController::new(store);
        assert_eq!(controller.persist("reader", &[]).await.unwrap(), 0);
    }
}

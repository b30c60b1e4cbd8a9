//! Shared helpers for unit tests.

pub mod fakes;
pub mod socket_guard;

use crate::db::Database;
use crate::store::SqliteStore;

/// In-memory store with one empty profile.
pub async fn store_with_profile(user_id: &str) -> SqliteStore {
    let store = memory_store().await;
    crate::store::BookStore::create_profile(&store, user_id)
        .await
        .unwrap_or_else(|e| panic!("create profile: {e}"));
    store
}

/// Empty in-memory store.
pub async fn memory_store() -> SqliteStore {
    let db = Database::new_in_memory()
        .await
        .unwrap_or_else(|e| panic!("in-memory database: {e}"));
    SqliteStore::new(db)
}

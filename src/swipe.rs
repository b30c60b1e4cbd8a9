//! Swipe handling: moving queue entries into the liked or disliked set.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::store::{BookStore, Collection, StoreError, StoredBook};

/// Errors from a swipe.
#[derive(Debug, Error)]
pub enum SwipeError {
    #[error("book '{doc_id}' is not in the queue or the {opposite} set for user '{user_id}'")]
    NotFound {
        user_id: String,
        doc_id: String,
        opposite: Collection,
    },

    #[error(transparent)]
    Store(StoreError),
}

/// Swipe direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Like,
    Dislike,
}

impl Swipe {
    /// Collection the book ends up in.
    #[must_use]
    pub fn target(self) -> Collection {
        match self {
            Self::Like => Collection::Liked,
            Self::Dislike => Collection::Disliked,
        }
    }

    /// The other swipe set; a book may change its mind from there.
    #[must_use]
    pub fn opposite(self) -> Collection {
        match self {
            Self::Like => Collection::Disliked,
            Self::Dislike => Collection::Liked,
        }
    }
}

/// Moves books between a user's collections.
pub struct SwipeService {
    store: Arc<dyn BookStore>,
}

impl SwipeService {
    #[must_use]
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Moves `doc_id` from the queue (or the opposite set) into the swipe's target set.
    ///
    /// # Errors
    ///
    /// Returns [`SwipeError::NotFound`] when the book is in neither source
    /// collection, or [`SwipeError::Store`] on a storage failure.
    #[instrument(skip(self))]
    pub async fn swipe(
        &self,
        user_id: &str,
        doc_id: &str,
        swipe: Swipe,
    ) -> Result<StoredBook, SwipeError> {
        let moved = self
            .store
            .move_book(
                user_id,
                doc_id,
                &[Collection::Queue, swipe.opposite()],
                swipe.target(),
            )
            .await
            .map_err(|e| match e {
                StoreError::BookNotFound { .. } => SwipeError::NotFound {
                    user_id: user_id.to_string(),
                    doc_id: doc_id.to_string(),
                    opposite: swipe.opposite(),
                },
                other => SwipeError::Store(other),
            })?;
        info!(collection = %moved.collection, "Book swiped");
        Ok(moved)
    }
}

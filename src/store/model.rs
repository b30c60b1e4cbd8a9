//! Profile and book types persisted by the store.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::SanitizedRecord;

/// One of the three per-user book collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Books waiting to be swiped.
    Queue,
    /// Books the user swiped right on.
    Liked,
    /// Books the user swiped left on.
    Disliked,
}

impl Collection {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Liked => "liked",
            Self::Disliked => "disliked",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queue" => Ok(Self::Queue),
            "liked" => Ok(Self::Liked),
            "disliked" => Ok(Self::Disliked),
            _ => Err(format!("invalid collection: {s}")),
        }
    }
}

/// An author kept on the user's shortlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortlistedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_work: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_count: Option<u64>,
    /// Why the suggestion service proposed this author; absent for history-derived entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Per-user preference and queue-state document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    /// Highest-scoring subjects first, at most five.
    pub subject_keywords: Vec<String>,
    /// Subjects already sampled by the subject feed.
    pub fetched_subjects: Vec<String>,
    /// Next free queue position.
    pub current_index: i64,
    /// Advisory pipeline lock.
    pub is_updating: bool,
    /// Modal decade of liked books, e.g. `"1990s"`.
    pub favourite_publishing_period: Option<String>,
    pub shortlisted_authors: Vec<ShortlistedAuthor>,
    pub created_at: String,
}

/// Derived preference fields written by the profiler in a single update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreferenceUpdate {
    pub subject_keywords: Vec<String>,
    /// `None` leaves the stored period untouched.
    pub favourite_publishing_period: Option<String>,
    pub shortlisted_authors: Vec<ShortlistedAuthor>,
}

/// A stored book document.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBook {
    pub doc_id: String,
    pub work_key: Option<String>,
    pub collection: Collection,
    pub data: Value,
    pub created_at: String,
}

impl StoredBook {
    /// Reads a string field from the document body.
    #[must_use]
    pub fn text_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Reads a list of strings from the document body, skipping non-string items.
    #[must_use]
    pub fn text_list(&self, key: &str) -> Vec<&str> {
        self.data
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// A sanitized queue entry ready for a batch write.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueDocument {
    pub doc_id: String,
    pub work_key: String,
    pub record: SanitizedRecord,
}

/// Result of attempting to take the advisory pipeline lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    /// Lock taken; carries the profile as read in the same statement.
    Acquired(UserProfile),
    /// Another run holds the lock.
    AlreadyUpdating,
    /// No profile document exists.
    ProfileMissing,
}

/// Notification published after a document is created in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    BookCreated {
        user_id: String,
        doc_id: String,
        collection: Collection,
    },
}

//! Error types for store operations.

use std::fmt;

use thiserror::Error;

/// Classification of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDbErrorKind {
    /// Another writer holds the database, or no pooled connection freed up
    /// in time. Retrying later can succeed.
    Contended,
    /// A unique, foreign-key, check or not-null constraint rejected a write.
    Constraint,
    /// The database file or pool is gone.
    Unavailable,
    /// Anything else.
    Other,
}

impl StoreDbErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::Contended,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) => Self::Unavailable,
            sqlx::Error::Database(db) => classify_sqlite_error(db.as_ref()),
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn is_transient(self) -> bool {
        self == Self::Contended
    }
}

impl fmt::Display for StoreDbErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Contended => "contended",
            Self::Constraint => "constraint",
            Self::Unavailable => "unavailable",
            Self::Other => "other",
        })
    }
}

// SQLite reports busy as 5 and locked as 6; extended codes keep the low byte.
fn classify_sqlite_error(db: &(dyn sqlx::error::DatabaseError + 'static)) -> StoreDbErrorKind {
    let primary = db
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff);
    match primary {
        Some(5 | 6) => StoreDbErrorKind::Contended,
        _ if db.is_unique_violation()
            || db.is_foreign_key_violation()
            || db.is_check_violation()
            || primary == Some(19) =>
        {
            StoreDbErrorKind::Constraint
        }
        _ if db.message().contains("database is locked") => StoreDbErrorKind::Contended,
        _ => StoreDbErrorKind::Other,
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        /// Typed classification used for failure handling.
        kind: StoreDbErrorKind,
        /// Human-readable database error text.
        message: String,
    },

    /// No profile exists for the user.
    #[error(
        "user profile not found: '{0}'\n  Suggestion: Run `bookswipe setup --user <id>` to create the profile"
    )]
    ProfileNotFound(String),

    /// The book is not in any of the collections it was expected in.
    #[error("book '{doc_id}' not found for user '{user_id}' in {expected}")]
    BookNotFound {
        /// Owner of the collections that were searched.
        user_id: String,
        /// Document id that was looked up.
        doc_id: String,
        /// Human-readable list of searched collections.
        expected: String,
    },

    /// A stored JSON column could not be encoded or decoded.
    #[error("corrupt stored document for user '{user_id}': {message}")]
    Serialization {
        /// Owner of the row.
        user_id: String,
        /// Decoder message.
        message: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: StoreDbErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl StoreError {
    pub(crate) fn serialization(user_id: &str, err: &serde_json::Error) -> Self {
        Self::Serialization {
            user_id: user_id.to_string(),
            message: err.to_string(),
        }
    }

    /// True when the failure came from lock or pool contention.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database { kind, .. } if kind.is_transient())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_database_message() {
        let err = StoreError::Database {
            kind: StoreDbErrorKind::Other,
            message: "connection failed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("database error (other)"));
        assert!(msg.contains("connection failed"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
        assert!(err.to_string().contains("contended"));
    }

    #[test]
    fn test_closed_pool_is_not_transient() {
        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(matches!(
            err,
            StoreError::Database {
                kind: StoreDbErrorKind::Unavailable,
                ..
            }
        ));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_store_error_profile_not_found_has_suggestion() {
        let err = StoreError::ProfileNotFound("reader-9".to_string());
        let msg = err.to_string();
        assert!(msg.contains("reader-9"));
        assert!(msg.contains("Suggestion"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_store_error_book_not_found_message() {
        let err = StoreError::BookNotFound {
            user_id: "reader-1".to_string(),
            doc_id: "OL1W".to_string(),
            expected: "queue or disliked".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("OL1W"));
        assert!(msg.contains("queue or disliked"));
    }
}

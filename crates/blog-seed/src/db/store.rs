//! The narrow store interface the seeder writes through.

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewPost, NewUser, Post, User, UserWithPosts};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Constraint violation{}: {message}", constraint_suffix(.constraint))]
    ConstraintViolation {
        constraint: Option<String>,
        message: String,
    },
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Store is unreachable")]
    Unreachable,
    #[error("Query error: {0}")]
    Query(#[source] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Unreachable)
    }
}

fn constraint_suffix(constraint: &Option<String>) -> String {
    constraint
        .as_deref()
        .map(|c| format!(" on {c}"))
        .unwrap_or_default()
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error()
            && matches!(
                db.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            )
        {
            return Self::ConstraintViolation {
                constraint: db.constraint().map(str::to_owned),
                message: db.message().to_owned(),
            };
        }

        match err {
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed) => Self::Connection(e),
            other => Self::Query(other),
        }
    }
}

/// Storage backend for the seeder.
///
/// Identifiers and timestamps are always assigned by the backend.
#[async_trait]
pub trait PersistenceLayer: Send + Sync {
    /// Inserts a user and its posts as one atomic unit.
    ///
    /// Either every row is written or none is.
    async fn insert_user_with_posts(
        &self,
        user: &NewUser,
        posts: &[NewPost],
    ) -> Result<UserWithPosts, StoreError>;

    /// Inserts a post with no author.
    async fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError>;

    /// Releases the underlying connection(s).
    async fn close(&self);

    async fn count_users(&self) -> Result<i64, StoreError>;

    async fn count_posts(&self) -> Result<i64, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError>;

    /// Returns every post whose author is null.
    async fn orphan_posts(&self) -> Result<Vec<Post>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connection_errors() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_connection());

        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(err.is_connection());
    }

    #[test]
    fn test_row_not_found_is_query_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Query(_)));
        assert!(!err.is_connection());
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_constraint_violation_message() {
        let err = StoreError::ConstraintViolation {
            constraint: Some("users_email_key".to_string()),
            message: "duplicate key value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Constraint violation on users_email_key: duplicate key value"
        );

        let err = StoreError::ConstraintViolation {
            constraint: None,
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.to_string(), "Constraint violation: duplicate key value");
    }
}

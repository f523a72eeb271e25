use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a [`UserStore`](crate::auth::UserStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(Uuid),
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User {0} already exists")]
    AlreadyExists(String),
    #[error("no user registered with email {0}")]
    UserNotFound(String),
    #[error("invalid reset token")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                        // assigned by the store
    pub email: String,                   // unique
    #[serde(skip_serializing)]
    pub hashed_password: String,         // Argon2 PHC string, not exposed in JSON
    pub session_id: Option<String>,      // set while a session is active
    pub reset_token: Option<String>,     // set while a reset is outstanding
    pub created_at: OffsetDateTime,
}

/// Partial update of a [`User`]. `None` leaves a column alone; for the
/// nullable columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub hashed_password: Option<String>,
    pub session_id: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hashed_password(mut self, hash: impl Into<String>) -> Self {
        self.hashed_password = Some(hash.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(Some(session_id.into()));
        self
    }

    pub fn clear_session(mut self) -> Self {
        self.session_id = Some(None);
        self
    }

    pub fn reset_token(mut self, token: impl Into<String>) -> Self {
        self.reset_token = Some(Some(token.into()));
        self
    }

    pub fn clear_reset_token(mut self) -> Self {
        self.reset_token = Some(None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hashed_password.is_none() && self.session_id.is_none() && self.reset_token.is_none()
    }

    /// Apply the update to an in-memory record.
    pub fn apply(self, user: &mut User) {
        if let Some(hash) = self.hashed_password {
            user.hashed_password = hash;
        }
        if let Some(session_id) = self.session_id {
            user.session_id = session_id;
        }
        if let Some(token) = self.reset_token {
            user.reset_token = token;
        }
    }
}

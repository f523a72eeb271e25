use crate::auth::errors::StoreError;
use crate::auth::repo_types::{User, UserUpdate};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

/// Persistence port the [`Auth`](crate::auth::Auth) facade talks to.
///
/// Lookups return `Ok(None)` on a miss. `update_user` fails with
/// [`StoreError::UserNotFound`] when the id is unknown. Each call must be
/// atomic for the row it touches; the facade adds no locking of its own.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_session_id(&self, session_id: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError>;
    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<(), StoreError>;
}

/// [`UserStore`] backed by the `users` table in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    // `column` is always one of the literals below, never caller input.
    async fn find_by(&self, column: &'static str, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            SELECT id, email, hashed_password, session_id, reset_token, created_at
            FROM users
            WHERE {column} = $1
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_by("email", email).await
    }

    async fn find_user_by_session_id(&self, session_id: &str) -> Result<Option<User>, StoreError> {
        self.find_by("session_id", session_id).await
    }

    async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        self.find_by("reset_token", token).await
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, hashed_password)
            VALUES ($1, $2)
            RETURNING id, email, hashed_password, session_id, reset_token, created_at
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail(email.to_string())
            }
            other => StoreError::Database(other),
        })?;
        debug!(user_id = %user.id, "user row inserted");
        Ok(user)
    }

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
            return found.map(|_| ()).ok_or(StoreError::UserNotFound(user_id));
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(hash) = update.hashed_password {
                set.push("hashed_password = ").push_bind_unseparated(hash);
            }
            if let Some(session_id) = update.session_id {
                set.push("session_id = ").push_bind_unseparated(session_id);
            }
            if let Some(token) = update.reset_token {
                set.push("reset_token = ").push_bind_unseparated(token);
            }
        }
        qb.push(" WHERE id = ").push_bind(user_id).push(" RETURNING id");

        let updated = qb
            .build_query_scalar::<Uuid>()
            .fetch_optional(&self.db)
            .await?;
        match updated {
            Some(_) => {
                debug!(user_id = %user_id, "user row updated");
                Ok(())
            }
            None => Err(StoreError::UserNotFound(user_id)),
        }
    }
}

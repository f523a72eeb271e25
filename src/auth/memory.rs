//! In-process [`UserStore`] for tests and embedders without a database.
use crate::auth::errors::StoreError;
use crate::auth::repo::UserStore;
use crate::auth::repo_types::{User, UserUpdate};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn find_where(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.read().values().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find_where(|u| u.email == email))
    }

    async fn find_user_by_session_id(&self, session_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find_where(|u| u.session_id.as_deref() == Some(session_id)))
    }

    async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find_where(|u| u.reset_token.as_deref() == Some(token)))
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            session_id: None,
            reset_token: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        update.apply(user);
        Ok(())
    }
}

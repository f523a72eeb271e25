use crate::auth::errors::{AuthError, StoreError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::{User, UserUpdate};
use crate::auth::token::generate_uuid;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Authentication facade over a [`UserStore`].
///
/// Holds no state besides the store. Every method is one request/response
/// sequence against it; "not found" outcomes are converted at this boundary
/// into the documented sentinel or typed error.
#[derive(Debug)]
pub struct Auth<S> {
    store: S,
}

impl<S: UserStore> Auth<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a new user. Fails with [`AuthError::AlreadyExists`] when the
    /// email is taken.
    #[instrument(skip(self, password))]
    pub async fn register_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::AlreadyExists(email.to_string()));
        }

        let hashed = hash_password(password)?;
        let user = match self.store.create_user(email, &hashed).await {
            Ok(u) => u,
            // lost a race with a concurrent registration
            Err(StoreError::DuplicateEmail(_)) => {
                warn!(email = %email, "email registered concurrently");
                return Err(AuthError::AlreadyExists(email.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Check `password` against the stored hash. Never fails: empty input,
    /// unknown email, store errors and unreadable hashes all yield `false`.
    #[instrument(skip(self, password))]
    pub async fn valid_login(&self, email: &str, password: &str) -> bool {
        if email.is_empty() || password.is_empty() {
            return false;
        }

        let user = match self.store.find_user_by_email(email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                debug!(email = %email, "login unknown email");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "find_user_by_email failed during login");
                return false;
            }
        };

        match verify_password(password, &user.hashed_password) {
            Ok(true) => true,
            Ok(false) => {
                debug!(user_id = %user.id, "login invalid password");
                false
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "stored hash unreadable");
                false
            }
        }
    }

    /// Start a session for `email`, replacing any previous one. Returns
    /// `None` when no such user exists.
    #[instrument(skip(self))]
    pub async fn create_session(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            debug!(email = %email, "no user for session");
            return Ok(None);
        };

        let session_id = generate_uuid();
        match self
            .store
            .update_user(user.id, UserUpdate::new().session_id(session_id.clone()))
            .await
        {
            Ok(()) => {}
            Err(StoreError::UserNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "session created");
        Ok(Some(session_id))
    }

    /// Resolve a session id to its user. Empty or missing ids return `None`
    /// without touching the store.
    #[instrument(skip_all)]
    pub async fn get_user_from_session_id(
        &self,
        session_id: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        let Some(session_id) = session_id.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        Ok(self.store.find_user_by_session_id(session_id).await?)
    }

    /// Clear the user's session. An unknown `user_id` is a silent no-op.
    #[instrument(skip(self))]
    pub async fn destroy_session(&self, user_id: Uuid) -> Result<(), AuthError> {
        match self
            .store
            .update_user(user_id, UserUpdate::new().clear_session())
            .await
        {
            Ok(()) => {
                info!(user_id = %user_id, "session destroyed");
                Ok(())
            }
            Err(StoreError::UserNotFound(_)) => {
                debug!(user_id = %user_id, "destroy_session for unknown user ignored");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Issue a reset token for `email`. An outstanding token is returned
    /// unchanged rather than rotated.
    #[instrument(skip(self))]
    pub async fn get_reset_password_token(&self, email: &str) -> Result<String, AuthError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(email.to_string()))?;

        if let Some(token) = user.reset_token.filter(|t| !t.is_empty()) {
            debug!(user_id = %user.id, "reusing outstanding reset token");
            return Ok(token);
        }

        let token = generate_uuid();
        self.store
            .update_user(user.id, UserUpdate::new().reset_token(token.clone()))
            .await
            .map_err(|e| match e {
                StoreError::UserNotFound(_) => AuthError::UserNotFound(email.to_string()),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "reset token issued");
        Ok(token)
    }

    /// Consume `reset_token` and set a new password in a single update.
    #[instrument(skip_all)]
    pub async fn update_password(&self, reset_token: &str, password: &str) -> Result<(), AuthError> {
        if reset_token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let user = self
            .store
            .find_user_by_reset_token(reset_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let hashed = hash_password(password)?;
        self.store
            .update_user(
                user.id,
                UserUpdate::new().hashed_password(hashed).clear_reset_token(),
            )
            .await
            .map_err(|e| match e {
                StoreError::UserNotFound(_) => AuthError::InvalidToken,
                other => other.into(),
            })?;

        info!(user_id = %user.id, "password updated");
        Ok(())
    }
}

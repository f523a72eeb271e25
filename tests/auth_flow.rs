use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use user_auth::{Auth, AuthError, MemoryUserStore, StoreError, User, UserStore, UserUpdate};
use uuid::Uuid;

fn auth() -> Auth<MemoryUserStore> {
    let _ = user_auth::telemetry::init_tracing();
    Auth::new(MemoryUserStore::new())
}

/// Wraps the memory store and counts session lookups.
#[derive(Default)]
struct CountingStore {
    inner: MemoryUserStore,
    session_lookups: AtomicUsize,
}

#[async_trait]
impl UserStore for CountingStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }
    async fn find_user_by_session_id(&self, session_id: &str) -> Result<Option<User>, StoreError> {
        self.session_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_user_by_session_id(session_id).await
    }
    async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_reset_token(token).await
    }
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, StoreError> {
        self.inner.create_user(email, hashed_password).await
    }
    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<(), StoreError> {
        self.inner.update_user(user_id, update).await
    }
}

/// Every call fails as if the database were unreachable.
struct BrokenStore;

#[async_trait]
impl UserStore for BrokenStore {
    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
    async fn find_user_by_session_id(&self, _s: &str) -> Result<Option<User>, StoreError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
    async fn find_user_by_reset_token(&self, _t: &str) -> Result<Option<User>, StoreError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
    async fn create_user(&self, _e: &str, _h: &str) -> Result<User, StoreError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
    async fn update_user(&self, _id: Uuid, _u: UserUpdate) -> Result<(), StoreError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
}

#[tokio::test]
async fn register_hashes_password() {
    let auth = auth();
    let user = auth.register_user("me@example.com", "s3cret").await.unwrap();
    assert_eq!(user.email, "me@example.com");
    assert_ne!(user.hashed_password, "s3cret");
    assert!(user.session_id.is_none());
    assert!(user.reset_token.is_none());

    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("hashed_password").is_none());
}

#[tokio::test]
async fn register_twice_fails_with_already_exists() {
    let auth = auth();
    auth.register_user("dup@example.com", "one").await.unwrap();
    let err = auth.register_user("dup@example.com", "two").await.unwrap_err();
    assert!(matches!(err, AuthError::AlreadyExists(ref e) if e == "dup@example.com"));
    assert_eq!(auth.store().len(), 1);
    assert!(auth.valid_login("dup@example.com", "one").await);
}

#[tokio::test]
async fn valid_login_checks_password() {
    let auth = auth();
    auth.register_user("bob@example.com", "hunter2").await.unwrap();

    assert!(auth.valid_login("bob@example.com", "hunter2").await);
    assert!(!auth.valid_login("bob@example.com", "hunter3").await);
    assert!(!auth.valid_login("nobody@example.com", "hunter2").await);
    assert!(!auth.valid_login("", "hunter2").await);
    assert!(!auth.valid_login("bob@example.com", "").await);
}

#[tokio::test]
async fn valid_login_is_false_when_store_fails() {
    let auth = Auth::new(BrokenStore);
    assert!(!auth.valid_login("bob@example.com", "hunter2").await);
}

#[tokio::test]
async fn valid_login_is_false_for_corrupt_stored_hash() {
    let store = MemoryUserStore::new();
    store.create_user("c@example.com", "plaintext-by-mistake").await.unwrap();
    let auth = Auth::new(store);
    assert!(!auth.valid_login("c@example.com", "plaintext-by-mistake").await);
}

#[tokio::test]
async fn new_session_replaces_old_one() {
    let auth = auth();
    let user = auth.register_user("s@example.com", "pw").await.unwrap();

    let first = auth.create_session("s@example.com").await.unwrap().unwrap();
    let second = auth.create_session("s@example.com").await.unwrap().unwrap();
    assert_ne!(first, second);

    assert!(auth.get_user_from_session_id(Some(&first)).await.unwrap().is_none());
    let found = auth.get_user_from_session_id(Some(&second)).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn create_session_for_unknown_email_is_none() {
    let auth = auth();
    assert!(auth.create_session("ghost@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn empty_session_id_skips_store() {
    let auth = Auth::new(CountingStore::default());
    assert!(auth.get_user_from_session_id(None).await.unwrap().is_none());
    assert!(auth.get_user_from_session_id(Some("")).await.unwrap().is_none());
    assert_eq!(auth.store().session_lookups.load(Ordering::SeqCst), 0);

    assert!(auth.get_user_from_session_id(Some("nope")).await.unwrap().is_none());
    assert_eq!(auth.store().session_lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn destroy_session_clears_session() {
    let auth = auth();
    let user = auth.register_user("d@example.com", "pw").await.unwrap();
    let sid = auth.create_session("d@example.com").await.unwrap().unwrap();

    auth.destroy_session(user.id).await.unwrap();
    assert!(auth.get_user_from_session_id(Some(&sid)).await.unwrap().is_none());
}

#[tokio::test]
async fn destroy_session_for_unknown_user_is_noop() {
    let auth = auth();
    auth.register_user("e@example.com", "pw").await.unwrap();
    let sid = auth.create_session("e@example.com").await.unwrap().unwrap();

    auth.destroy_session(Uuid::new_v4()).await.unwrap();
    assert!(auth.get_user_from_session_id(Some(&sid)).await.unwrap().is_some());
}

#[tokio::test]
async fn destroy_session_surfaces_store_failures() {
    let auth = Auth::new(BrokenStore);
    let err = auth.destroy_session(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AuthError::Store(StoreError::Database(_))));
}

#[tokio::test]
async fn reset_token_is_idempotent() {
    let auth = auth();
    auth.register_user("r@example.com", "pw").await.unwrap();

    let first = auth.get_reset_password_token("r@example.com").await.unwrap();
    let second = auth.get_reset_password_token("r@example.com").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn reset_token_for_unknown_email_fails() {
    let auth = auth();
    let err = auth.get_reset_password_token("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound(ref e) if e == "ghost@example.com"));
}

#[tokio::test]
async fn update_password_consumes_token() {
    let auth = auth();
    auth.register_user("u@example.com", "old-pw").await.unwrap();
    let token = auth.get_reset_password_token("u@example.com").await.unwrap();

    auth.update_password(&token, "new-pw").await.unwrap();
    assert!(auth.valid_login("u@example.com", "new-pw").await);
    assert!(!auth.valid_login("u@example.com", "old-pw").await);

    let err = auth.update_password(&token, "other-pw").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
    assert!(auth.valid_login("u@example.com", "new-pw").await);

    let fresh = auth.get_reset_password_token("u@example.com").await.unwrap();
    assert_ne!(fresh, token);
}

#[tokio::test]
async fn update_password_rejects_unknown_or_empty_token() {
    let auth = auth();
    assert!(matches!(
        auth.update_password("not-a-token", "pw").await,
        Err(AuthError::InvalidToken)
    ));
    assert!(matches!(
        auth.update_password("", "pw").await,
        Err(AuthError::InvalidToken)
    ));
}

//! Credential and session helper over a persistent user store.
//!
//! [`auth::Auth`] registers users, checks passwords, hands out opaque
//! session ids and runs the password-reset token flow. Persistence is
//! delegated to any [`auth::UserStore`].

pub mod auth;
pub mod config;
pub mod db;
pub mod telemetry;

pub use auth::{Auth, AuthError, MemoryUserStore, PgUserStore, StoreError, User, UserStore, UserUpdate};

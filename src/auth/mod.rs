mod errors;
pub mod memory;
pub mod password;
pub mod repo;
mod repo_types;
pub mod services;
pub mod token;

pub use errors::{AuthError, StoreError};
pub use memory::MemoryUserStore;
pub use repo::{PgUserStore, UserStore};
pub use repo_types::{User, UserUpdate};
pub use services::Auth;

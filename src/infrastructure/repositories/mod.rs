//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **MessageRepository** - Conversation reads, inserts and per-user soft deletion
//! - **CallRepository** - Call history written by the relay's recorder
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{PgCallRepository, PgMessageRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let message_repo = PgMessageRepository::new(pool.clone());
//!     let call_repo = PgCallRepository::new(pool.clone());
//! }
//! ```

mod call_repository;
mod message_repository;

pub use call_repository::PgCallRepository;
pub use message_repository::PgMessageRepository;

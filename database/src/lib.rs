//! SQLite persistence for players, matches, games, approvals and stats.
//!
//! Query functions take a `&mut SqliteConnection` so that several of them can
//! run inside one transaction opened with [`Database::begin`].

pub mod config;
pub mod error;
pub mod models;
pub mod queries;
pub mod repository;
pub mod retry;

pub use config::DatabaseConfig;
pub use error::DatabaseError;
pub use models::{MatchQuery, NewGame, NewMatch, NewPlayer, RackResult, RefreshTokenRecord};
pub use repository::{commit, Database, Tx};
pub use retry::{retry_with_backoff, RetryPolicy};

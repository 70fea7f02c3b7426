use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::DatabaseError;

const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Resolves the database URL from, in order: the CLI argument, `DATABASE_URL`,
    /// the YAML value, and finally an in-memory database.
    pub fn from_cli_or_env_or_yaml(cli_arg: Option<String>, yaml_config: Option<String>) -> Self {
        let url = if let Some(arg) = cli_arg {
            arg
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else if let Some(yaml) = yaml_config {
            yaml
        } else {
            IN_MEMORY_URL.to_string()
        };

        Self::new(url)
    }

    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        // every connection to :memory: is its own database
        let pool_size = if Self::is_memory_url(&url) { 1 } else { 5 };
        Self {
            url,
            pool_size,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_URL)
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        if !self.is_memory() {
            self.pool_size = pool_size.max(1);
        }
        self
    }

    pub fn is_memory(&self) -> bool {
        Self::is_memory_url(&self.url)
    }

    fn is_memory_url(url: &str) -> bool {
        url == IN_MEMORY_URL || url == ":memory:" || url.contains("mode=memory")
    }

    pub fn connect_options(&self) -> Result<SqliteConnectOptions, DatabaseError> {
        let options = if self.is_memory() {
            SqliteConnectOptions::from_str(IN_MEMORY_URL).map_err(DatabaseError::Connection)?
        } else if self.url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&self.url)
                .map_err(DatabaseError::Connection)?
                .create_if_missing(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.url)
                .create_if_missing(true)
        };

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }

    pub async fn create_pool(&self) -> Result<SqlitePool, DatabaseError> {
        let mut options = SqlitePoolOptions::new().max_connections(self.pool_size);
        if self.is_memory() {
            // the database lives only as long as its one connection
            options = options.min_connections(1).idle_timeout(None).max_lifetime(None);
        }
        options
            .connect_with(self.connect_options()?)
            .await
            .map_err(DatabaseError::Connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let config = DatabaseConfig::from_cli_or_env_or_yaml(
            Some("league.db".to_string()),
            Some("other.db".to_string()),
        );
        assert_eq!(config.url, "league.db");
        assert_eq!(config.pool_size, 5);
    }

    #[test]
    fn memory_database_uses_a_single_connection() {
        let config = DatabaseConfig::in_memory();
        assert!(config.is_memory());
        assert_eq!(config.pool_size, 1);
    }

    #[test]
    fn pool_size_override_ignored_for_memory() {
        assert_eq!(DatabaseConfig::in_memory().with_pool_size(8).pool_size, 1);
        assert_eq!(DatabaseConfig::new("league.db").with_pool_size(8).pool_size, 8);
        assert_eq!(DatabaseConfig::new("league.db").with_pool_size(0).pool_size, 1);
    }
}

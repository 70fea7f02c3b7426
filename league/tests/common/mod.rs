#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use database::{Database, DatabaseConfig};
use league::{JwtTokenService, League, LeagueError, PasswordHasher};
use tempfile::TempDir;
use types::{FixedClock, MatchId, Player};

pub const PASSWORD: &str = "break-and-run";

/// Stores `plain$<password>`, the same scheme as the unit-test fixture.
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, LeagueError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, LeagueError> {
        Ok(self.hash(password)? == hash)
    }
}

pub struct TestLeague {
    pub league: League,
    /// The store behind `league`, for checking rows directly.
    pub db: Database,
    pub clock: Arc<FixedClock>,
    // keeps the database file alive
    _dir: Option<TempDir>,
}

impl TestLeague {
    pub async fn player(&self, handle: &str) -> Player {
        self.league
            .identity
            .register(&format!("{handle}@example.com"), handle, handle, PASSWORD)
            .await
            .expect("Failed to register player")
    }

    pub async fn trio(&self) -> (Player, Player, Player) {
        (self.player("alice").await, self.player("bob").await, self.player("carol").await)
    }

    pub async fn approval_rows(&self, match_id: MatchId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM approvals WHERE match_id = ?")
            .bind(match_id.as_i64())
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count approvals")
    }
}

fn build(db: Database, dir: Option<TempDir>) -> TestLeague {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap(),
    ));
    let tokens = JwtTokenService::new(b"integration", Duration::minutes(15), Duration::days(7));
    TestLeague {
        league: League::new(db.clone(), Arc::new(PlainHasher), Arc::new(tokens), clock.clone()),
        db,
        clock,
        _dir: dir,
    }
}

pub async fn in_memory() -> TestLeague {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    build(db, None)
}

/// A file-backed league whose pool really runs transactions side by side.
pub async fn on_disk() -> TestLeague {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("league.db");
    let config = DatabaseConfig::new(path.display().to_string()).with_pool_size(5);
    let db = Database::connect(&config)
        .await
        .expect("Failed to open test database");
    build(db, Some(dir))
}

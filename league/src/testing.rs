use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use database::Database;
use types::{FixedClock, Player};

use crate::{JwtTokenService, League, LeagueError, PasswordHasher};

pub const PASSWORD: &str = "break-and-run";

/// Stores `plain$<password>` so tests don't pay for argon2.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, LeagueError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, LeagueError> {
        Ok(self.hash(password)? == hash)
    }
}

#[test]
fn plain_hasher_round_trip() {
    let hash = PlainHasher.hash(PASSWORD).unwrap();
    assert_eq!(hash, format!("plain${PASSWORD}"));
    assert!(PlainHasher.verify(PASSWORD, &hash).unwrap());
    assert!(!PlainHasher.verify("scratch-on-the-8", &hash).unwrap());
}

pub struct Fixture {
    pub league: League,
    pub alice: Player,
    pub bob: Player,
    pub carol: Player,
    pub clock: Arc<FixedClock>,
}

/// A league over a fresh in-memory database with three registered players.
pub async fn league() -> Fixture {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 14, 19, 0, 0).unwrap(),
    ));
    let tokens = JwtTokenService::new(b"test-secret", Duration::minutes(15), Duration::days(7));
    let league = League::new(db, Arc::new(PlainHasher), Arc::new(tokens), clock.clone());

    let mut players = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let player = league
            .identity
            .register(&format!("{name}@example.com"), name, name, PASSWORD)
            .await
            .unwrap();
        players.push(player);
    }
    let carol = players.pop().unwrap();
    let bob = players.pop().unwrap();
    let alice = players.pop().unwrap();

    Fixture {
        league,
        alice,
        bob,
        carol,
        clock,
    }
}

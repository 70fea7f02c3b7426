//! Match lifecycle, game ledger, statistics and identity for a pool league.
//!
//! All services share one [`Database`] and one [`Clock`]; the acting player
//! is passed explicitly to every match operation.

pub mod auth;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod matches;
pub mod settings;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use database::Database;
use types::Clock;

pub use auth::{Argon2Hasher, JwtTokenService, PasswordHasher, TokenService};
pub use error::LeagueError;
pub use identity::{IdentityService, TokenPair};
pub use ledger::GameLedger;
pub use matches::{MatchDetail, MatchFilter, MatchService};
pub use settings::{Settings, SettingsError};
pub use stats::StatsService;

/// The services wired to one store.
#[derive(Clone)]
pub struct League {
    pub matches: MatchService<Database>,
    pub ledger: GameLedger,
    pub stats: StatsService,
    pub identity: IdentityService,
}

impl League {
    pub fn new(
        db: Database,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            matches: MatchService::new(db.clone(), db.clone(), clock.clone()),
            ledger: GameLedger::new(db.clone(), clock.clone()),
            stats: StatsService::new(db.clone(), clock.clone()),
            identity: IdentityService::new(db, hasher, tokens, clock),
        }
    }

    /// Argon2 passwords and JWTs configured from `settings`.
    pub fn from_settings(db: Database, settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        let tokens = JwtTokenService::new(
            settings.jwt_secret.as_bytes(),
            settings.access_ttl(),
            settings.refresh_ttl(),
        );
        Self::new(db, Arc::new(Argon2Hasher), Arc::new(tokens), clock)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::{
    Approval, Game, GameId, GameType, Match, MatchId, MatchStatus, Player, PlayerId, StatPeriod,
    StatSnapshot,
};

use crate::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRecord {
    pub id: String,
    pub email: String,
    pub handle: String,
    pub display_name: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRecord {
    pub id: i64,
    pub creator_id: String,
    pub opponent_id: String,
    pub game_type: String,
    pub race_to: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GameRecord {
    pub id: i64,
    pub match_id: i64,
    pub game_type: String,
    pub winner_id: String,
    pub loser_id: String,
    pub frame_number: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApprovalRecord {
    pub match_id: i64,
    pub approver_id: String,
    pub status: String,
    pub note: String,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatRecord {
    pub player_id: String,
    pub game_type: String,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub matches_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub racks_won: i64,
    pub racks_lost: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub player_id: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// One approved match as seen by the stats query. `winner_id` is `None` for
/// a match with no recorded games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackResult {
    pub match_id: MatchId,
    pub game_type: GameType,
    pub played_at: DateTime<Utc>,
    pub winner_id: Option<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct NewPlayer<'a> {
    pub id: PlayerId,
    pub email: &'a str,
    pub handle: &'a str,
    pub display_name: &'a str,
    pub password_hash: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewMatch {
    pub creator_id: PlayerId,
    pub opponent_id: PlayerId,
    pub game_type: GameType,
    pub race_to: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewGame {
    pub match_id: MatchId,
    pub game_type: GameType,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub frame_number: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Filters for listing matches. Every provided field must match; `participant`
/// matches either side of the pairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchQuery {
    pub participant: Option<PlayerId>,
    pub game_type: Option<GameType>,
    pub status: Option<MatchStatus>,
}

fn count(value: i64, column: &str) -> Result<u32, DatabaseError> {
    u32::try_from(value)
        .map_err(|_| DatabaseError::Decode(format!("{column} out of range: {value}")))
}

impl TryFrom<PlayerRecord> for Player {
    type Error = DatabaseError;

    fn try_from(r: PlayerRecord) -> Result<Self, Self::Error> {
        Ok(Player {
            id: r.id.parse()?,
            email: r.email,
            handle: r.handle,
            display_name: r.display_name,
            password_hash: r.password_hash,
            created_at: r.created_at,
        })
    }
}

impl TryFrom<MatchRecord> for Match {
    type Error = DatabaseError;

    fn try_from(r: MatchRecord) -> Result<Self, Self::Error> {
        Ok(Match {
            id: MatchId::new(r.id),
            creator_id: r.creator_id.parse()?,
            opponent_id: r.opponent_id.parse()?,
            game_type: r.game_type.parse()?,
            race_to: count(r.race_to, "race_to")?,
            status: r.status.parse()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl TryFrom<GameRecord> for Game {
    type Error = DatabaseError;

    fn try_from(r: GameRecord) -> Result<Self, Self::Error> {
        Ok(Game {
            id: GameId::new(r.id),
            match_id: MatchId::new(r.match_id),
            game_type: r.game_type.parse()?,
            winner_id: r.winner_id.parse()?,
            loser_id: r.loser_id.parse()?,
            frame_number: r
                .frame_number
                .map(|n| count(n, "frame_number"))
                .transpose()?,
            created_at: r.created_at,
        })
    }
}

impl TryFrom<ApprovalRecord> for Approval {
    type Error = DatabaseError;

    fn try_from(r: ApprovalRecord) -> Result<Self, Self::Error> {
        Ok(Approval {
            match_id: MatchId::new(r.match_id),
            approver_id: r.approver_id.parse()?,
            status: r.status.parse()?,
            note: r.note,
            decided_at: r.decided_at,
        })
    }
}

impl TryFrom<StatRecord> for StatSnapshot {
    type Error = DatabaseError;

    fn try_from(r: StatRecord) -> Result<Self, Self::Error> {
        Ok(StatSnapshot {
            player_id: r.player_id.parse()?,
            game_type: r.game_type.parse()?,
            period: StatPeriod::from_bounds(r.period_start, r.period_end),
            matches_played: count(r.matches_played, "matches_played")?,
            wins: count(r.wins, "wins")?,
            losses: count(r.losses, "losses")?,
            racks_won: count(r.racks_won, "racks_won")?,
            racks_lost: count(r.racks_lost, "racks_lost")?,
            updated_at: r.updated_at,
        })
    }
}

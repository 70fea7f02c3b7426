use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{GameType, PlayerId};

/// The time window a snapshot aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatPeriod {
    AllTime,
    /// Half-open: `start <= t < end`.
    Window {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl StatPeriod {
    /// The calendar month (UTC) containing `ts`.
    pub fn month_of(ts: DateTime<Utc>) -> Self {
        let start = Utc
            .with_ymd_and_hms(ts.year(), ts.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(ts);
        let (year, month) = if ts.month() == 12 {
            (ts.year() + 1, 1)
        } else {
            (ts.year(), ts.month() + 1)
        };
        let end = Utc
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .unwrap_or(ts);
        StatPeriod::Window { start, end }
    }

    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            StatPeriod::AllTime => (None, None),
            StatPeriod::Window { start, end } => (Some(*start), Some(*end)),
        }
    }

    pub fn from_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => StatPeriod::Window { start, end },
            _ => StatPeriod::AllTime,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        match self {
            StatPeriod::AllTime => true,
            StatPeriod::Window { start, end } => *start <= ts && ts < *end,
        }
    }
}

/// Per-player, per-game-type counters derived from approved matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub player_id: PlayerId,
    pub game_type: GameType,
    pub period: StatPeriod,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub racks_won: u32,
    pub racks_lost: u32,
    pub updated_at: DateTime<Utc>,
}

impl StatSnapshot {
    pub fn empty(
        player_id: PlayerId,
        game_type: GameType,
        period: StatPeriod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            player_id,
            game_type,
            period,
            matches_played: 0,
            wins: 0,
            losses: 0,
            racks_won: 0,
            racks_lost: 0,
            updated_at: now,
        }
    }
}

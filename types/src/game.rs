use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GameId, MatchId, ParseEnumError, PlayerId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    EightBall,
    NineBall,
    TenBall,
}

impl GameType {
    pub const ALL: [GameType; 3] = [GameType::EightBall, GameType::NineBall, GameType::TenBall];

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::EightBall => "EIGHT_BALL",
            GameType::NineBall => "NINE_BALL",
            GameType::TenBall => "TEN_BALL",
        }
    }
}

impl Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::EightBall => write!(f, "8-ball"),
            GameType::NineBall => write!(f, "9-ball"),
            GameType::TenBall => write!(f, "10-ball"),
        }
    }
}

impl FromStr for GameType {
    type Err = ParseEnumError;

    /// Accepts the stored form (`EIGHT_BALL`) as well as the short forms
    /// players type (`8-ball`, `eight`, `8`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "eight_ball" | "8_ball" | "eight" | "8" => Ok(GameType::EightBall),
            "nine_ball" | "9_ball" | "nine" | "9" => Ok(GameType::NineBall),
            "ten_ball" | "10_ball" | "ten" | "10" => Ok(GameType::TenBall),
            _ => Err(ParseEnumError {
                kind: "game type",
                value: s.to_string(),
            }),
        }
    }
}

/// One rack within a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub match_id: MatchId,
    pub game_type: GameType,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub frame_number: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn involves(&self, player: PlayerId) -> bool {
        self.winner_id == player || self.loser_id == player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_and_short_forms() {
        assert_eq!("EIGHT_BALL".parse::<GameType>().unwrap(), GameType::EightBall);
        assert_eq!("9-ball".parse::<GameType>().unwrap(), GameType::NineBall);
        assert_eq!("ten".parse::<GameType>().unwrap(), GameType::TenBall);
        assert!("straight_pool".parse::<GameType>().is_err());
    }

    #[test]
    fn stored_form_round_trips() {
        for game_type in GameType::ALL {
            assert_eq!(game_type.as_str().parse::<GameType>().unwrap(), game_type);
        }
    }
}

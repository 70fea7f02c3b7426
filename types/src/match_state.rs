use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GameType, MatchId, ParseEnumError, PlayerId};

/// Lifecycle of a match. `Pending` is the only non-terminal state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Pending,
    Approved,
    Declined,
    Cancelled,
}

/// A status-changing operation on a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    Approve,
    Decline,
    Cancel,
}

/// The part a player takes in a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Creator,
    Opponent,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Pending => "PENDING",
            MatchStatus::Approved => "APPROVED",
            MatchStatus::Declined => "DECLINED",
            MatchStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::Pending)
    }

    /// Games may only be added, edited or removed while this holds.
    pub fn accepts_games(self) -> bool {
        matches!(self, MatchStatus::Pending)
    }

    /// The status reached by applying `transition`, or `None` if the
    /// transition isn't valid from here.
    pub fn apply(self, transition: Transition) -> Option<MatchStatus> {
        match (self, transition) {
            (MatchStatus::Pending, Transition::Approve) => Some(MatchStatus::Approved),
            (MatchStatus::Pending, Transition::Decline) => Some(MatchStatus::Declined),
            (MatchStatus::Pending, Transition::Cancel) => Some(MatchStatus::Cancelled),
            _ => None,
        }
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(MatchStatus::Pending),
            "APPROVED" => Ok(MatchStatus::Approved),
            "DECLINED" => Ok(MatchStatus::Declined),
            "CANCELLED" => Ok(MatchStatus::Cancelled),
            _ => Err(ParseEnumError {
                kind: "match status",
                value: s.to_string(),
            }),
        }
    }
}

impl Transition {
    /// Who is allowed to perform this transition.
    pub fn required_role(self) -> Role {
        match self {
            Transition::Approve | Transition::Decline => Role::Opponent,
            Transition::Cancel => Role::Creator,
        }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Approve => write!(f, "approve"),
            Transition::Decline => write!(f, "decline"),
            Transition::Cancel => write!(f, "cancel"),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Creator => write!(f, "creator"),
            Role::Opponent => write!(f, "opponent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub creator_id: PlayerId,
    pub opponent_id: PlayerId,
    pub game_type: GameType,
    /// Advisory target; the number of recorded games is not capped by it.
    pub race_to: u32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn role_of(&self, player: PlayerId) -> Option<Role> {
        if player == self.creator_id {
            Some(Role::Creator)
        } else if player == self.opponent_id {
            Some(Role::Opponent)
        } else {
            None
        }
    }

    pub fn is_participant(&self, player: PlayerId) -> bool {
        self.role_of(player).is_some()
    }

    /// True when `{a, b}` is exactly the match's two participants.
    pub fn is_pairing(&self, a: PlayerId, b: PlayerId) -> bool {
        (a == self.creator_id && b == self.opponent_id)
            || (a == self.opponent_id && b == self.creator_id)
    }

    pub fn other_participant(&self, player: PlayerId) -> Option<PlayerId> {
        match self.role_of(player)? {
            Role::Creator => Some(self.opponent_id),
            Role::Opponent => Some(self.creator_id),
        }
    }
}

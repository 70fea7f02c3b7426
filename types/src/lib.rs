pub mod approval;
pub mod clock;
pub mod game;
pub mod ids;
pub mod match_state;
pub mod player;
pub mod stat;

pub use approval::{Approval, ApprovalStatus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use game::{Game, GameType};
pub use ids::{GameId, MatchId, PlayerId};
pub use match_state::{Match, MatchStatus, Role, Transition};
pub use player::{Player, PlayerLookup};
pub use stat::{StatPeriod, StatSnapshot};

use thiserror::Error;

/// A stored enumeration value that doesn't name any known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MatchId, MatchStatus, ParseEnumError, PlayerId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Declined,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Declined => "DECLINED",
        }
    }

    /// The approval decision recorded when a match reaches `status`.
    pub fn for_match_status(status: MatchStatus) -> Option<Self> {
        match status {
            MatchStatus::Approved => Some(ApprovalStatus::Approved),
            MatchStatus::Declined => Some(ApprovalStatus::Declined),
            MatchStatus::Pending | MatchStatus::Cancelled => None,
        }
    }
}

impl Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApprovalStatus::Pending),
            "APPROVED" => Ok(ApprovalStatus::Approved),
            "DECLINED" => Ok(ApprovalStatus::Declined),
            _ => Err(ParseEnumError {
                kind: "approval status",
                value: s.to_string(),
            }),
        }
    }
}

/// The opponent's decision on a match. At most one per match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub match_id: MatchId,
    pub approver_id: PlayerId,
    pub status: ApprovalStatus,
    pub note: String,
    pub decided_at: Option<DateTime<Utc>>,
}

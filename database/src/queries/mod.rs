pub mod approvals;
pub mod games;
pub mod matches;
pub mod players;
pub mod stats;
pub mod tokens;

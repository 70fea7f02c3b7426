use database::DatabaseError;
use thiserror::Error;

/// Everything a league operation can fail with. Callers decide how each kind
/// is presented; [`LeagueError::status_code`] gives the HTTP mapping.
#[derive(Error, Debug)]
pub enum LeagueError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("not permitted: {0}")]
    Authorization(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid credentials")]
    Credentials,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LeagueError {
    pub fn status_code(&self) -> u16 {
        match self {
            LeagueError::NotFound(_) => 404,
            LeagueError::Authorization(_) => 403,
            LeagueError::InvalidState(_) | LeagueError::InvalidArgument(_) => 400,
            LeagueError::Conflict(_) => 409,
            LeagueError::Credentials => 401,
            LeagueError::Internal(_) | LeagueError::Unavailable(_) => 500,
        }
    }

    /// Hides the existence of a resource from a caller who may not see it.
    pub fn hide_forbidden(self, what: impl Into<String>) -> Self {
        match self {
            LeagueError::Authorization(_) => LeagueError::NotFound(what.into()),
            other => other,
        }
    }
}

impl From<DatabaseError> for LeagueError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Conflict(msg) => LeagueError::Conflict(msg),
            DatabaseError::NotFound(what) => LeagueError::NotFound(what),
            other => {
                log::warn!("storage failure: {other}");
                LeagueError::Unavailable(Box::new(other))
            }
        }
    }
}

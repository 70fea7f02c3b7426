use thiserror::Error;
use types::ParseEnumError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Query execution error: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[source] sqlx::Error),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),

    #[error("UUID parsing error: {0}")]
    UuidParsing(#[from] uuid::Error),
}

impl DatabaseError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::Conflict(_))
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                tracing::debug!(error = %db_err, "unique constraint violated");
                DatabaseError::Conflict(db_err.message().to_string())
            }
            _ => DatabaseError::Query(e),
        }
    }
}

impl From<ParseEnumError> for DatabaseError {
    fn from(e: ParseEnumError) -> Self {
        DatabaseError::Decode(e.to_string())
    }
}

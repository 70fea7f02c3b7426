use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use types::{Match, MatchId, MatchStatus};

use crate::models::MatchRecord;
use crate::{DatabaseError, MatchQuery, NewMatch};

pub async fn insert_match(
    conn: &mut SqliteConnection,
    new: &NewMatch,
) -> Result<Match, DatabaseError> {
    let record = sqlx::query_as::<_, MatchRecord>(
        "INSERT INTO matches (creator_id, opponent_id, game_type, race_to, status, created_at,
                              updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(new.creator_id.to_string())
    .bind(new.opponent_id.to_string())
    .bind(new.game_type.as_str())
    .bind(i64::from(new.race_to))
    .bind(MatchStatus::Pending.as_str())
    .bind(new.created_at)
    .bind(new.created_at)
    .fetch_one(conn)
    .await?;

    Match::try_from(record)
}

pub async fn get_match(
    conn: &mut SqliteConnection,
    id: MatchId,
) -> Result<Option<Match>, DatabaseError> {
    sqlx::query_as::<_, MatchRecord>("SELECT * FROM matches WHERE id = ?")
        .bind(id.as_i64())
        .fetch_optional(conn)
        .await?
        .map(Match::try_from)
        .transpose()
}

/// Re-reads a match while taking SQLite's write lock.
///
/// Touching the row first means the transaction holds the lock before any
/// precondition is checked, so no other writer can change the match between
/// the read and the caller's own write.
pub async fn lock_match(
    conn: &mut SqliteConnection,
    id: MatchId,
    now: DateTime<Utc>,
) -> Result<Option<Match>, DatabaseError> {
    sqlx::query_as::<_, MatchRecord>(
        "UPDATE matches SET updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(now)
    .bind(id.as_i64())
    .fetch_optional(conn)
    .await?
    .map(Match::try_from)
    .transpose()
}

/// Moves a pending match to `status`. Returns false if the match is no longer
/// pending.
pub async fn set_status_if_pending(
    conn: &mut SqliteConnection,
    id: MatchId,
    status: MatchStatus,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "UPDATE matches SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(status.as_str())
    .bind(now)
    .bind(id.as_i64())
    .bind(MatchStatus::Pending.as_str())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Deletes a pending match; games and approval rows go with it.
pub async fn delete_match_if_pending(
    conn: &mut SqliteConnection,
    id: MatchId,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM matches WHERE id = ? AND status = ?")
        .bind(id.as_i64())
        .bind(MatchStatus::Pending.as_str())
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Lists matches matching every filter in `query`, newest first.
pub async fn list_matches(
    conn: &mut SqliteConnection,
    query: &MatchQuery,
) -> Result<Vec<Match>, DatabaseError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM matches WHERE 1 = 1");

    if let Some(participant) = query.participant {
        let participant = participant.to_string();
        builder
            .push(" AND (creator_id = ")
            .push_bind(participant.clone())
            .push(" OR opponent_id = ")
            .push_bind(participant)
            .push(")");
    }
    if let Some(game_type) = query.game_type {
        builder.push(" AND game_type = ").push_bind(game_type.as_str());
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    builder.push(" ORDER BY id DESC");

    builder
        .build_query_as::<MatchRecord>()
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(Match::try_from)
        .collect()
}

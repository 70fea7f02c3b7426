use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use types::{Approval, ApprovalStatus, MatchId, PlayerId};

use crate::models::ApprovalRecord;
use crate::DatabaseError;

/// Opens the approval request for a new match. `match_id` is unique, so a
/// second request for the same match is a [`DatabaseError::Conflict`].
pub async fn request_approval(
    conn: &mut SqliteConnection,
    match_id: MatchId,
    approver_id: PlayerId,
) -> Result<Approval, DatabaseError> {
    let record = sqlx::query_as::<_, ApprovalRecord>(
        "INSERT INTO approvals (match_id, approver_id, status, note) VALUES (?, ?, ?, '')
         RETURNING match_id, approver_id, status, note, decided_at",
    )
    .bind(match_id.as_i64())
    .bind(approver_id.to_string())
    .bind(ApprovalStatus::Pending.as_str())
    .fetch_one(conn)
    .await?;

    Approval::try_from(record)
}

/// Records the approver's decision on a still-pending approval, creating the
/// row if the match never had one. Returns `None` if a decision was already
/// recorded.
pub async fn record_decision(
    conn: &mut SqliteConnection,
    match_id: MatchId,
    approver_id: PlayerId,
    status: ApprovalStatus,
    note: &str,
    decided_at: DateTime<Utc>,
) -> Result<Option<Approval>, DatabaseError> {
    let updated = sqlx::query_as::<_, ApprovalRecord>(
        "UPDATE approvals SET approver_id = ?, status = ?, note = ?, decided_at = ?
         WHERE match_id = ? AND status = ?
         RETURNING match_id, approver_id, status, note, decided_at",
    )
    .bind(approver_id.to_string())
    .bind(status.as_str())
    .bind(note)
    .bind(decided_at)
    .bind(match_id.as_i64())
    .bind(ApprovalStatus::Pending.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(record) = updated {
        return Approval::try_from(record).map(Some);
    }
    if get_approval(&mut *conn, match_id).await?.is_some() {
        return Ok(None);
    }

    let inserted = sqlx::query_as::<_, ApprovalRecord>(
        "INSERT INTO approvals (match_id, approver_id, status, note, decided_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING match_id, approver_id, status, note, decided_at",
    )
    .bind(match_id.as_i64())
    .bind(approver_id.to_string())
    .bind(status.as_str())
    .bind(note)
    .bind(decided_at)
    .fetch_one(conn)
    .await?;

    Approval::try_from(inserted).map(Some)
}

/// Drops an undecided request. Returns false if there was none to drop.
pub async fn withdraw_request(
    conn: &mut SqliteConnection,
    match_id: MatchId,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM approvals WHERE match_id = ? AND status = ?")
        .bind(match_id.as_i64())
        .bind(ApprovalStatus::Pending.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_approval(
    conn: &mut SqliteConnection,
    match_id: MatchId,
) -> Result<Option<Approval>, DatabaseError> {
    sqlx::query_as::<_, ApprovalRecord>(
        "SELECT match_id, approver_id, status, note, decided_at FROM approvals WHERE match_id = ?",
    )
    .bind(match_id.as_i64())
    .fetch_optional(conn)
    .await?
    .map(Approval::try_from)
    .transpose()
}

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use types::PlayerId;

use crate::{DatabaseError, RefreshTokenRecord};

pub async fn store_refresh_token(
    conn: &mut SqliteConnection,
    player_id: PlayerId,
    token_hash: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<RefreshTokenRecord, DatabaseError> {
    let record = sqlx::query_as::<_, RefreshTokenRecord>(
        "INSERT INTO refresh_tokens (player_id, token_hash, created_at, expires_at)
         VALUES (?, ?, ?, ?)
         RETURNING *",
    )
    .bind(player_id.to_string())
    .bind(token_hash)
    .bind(created_at)
    .bind(expires_at)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn find_refresh_token(
    conn: &mut SqliteConnection,
    token_hash: &str,
) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
    let record = sqlx::query_as::<_, RefreshTokenRecord>(
        "SELECT * FROM refresh_tokens WHERE token_hash = ?",
    )
    .bind(token_hash)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Marks the token revoked. Returns false if it was unknown or already revoked.
pub async fn revoke_refresh_token(
    conn: &mut SqliteConnection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL",
    )
    .bind(now)
    .bind(token_hash)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{player, setup_test_db};

    #[tokio::test]
    async fn test_store_and_revoke_refresh_token() {
        let db = setup_test_db().await;
        let mut conn = db.acquire().await.unwrap();
        let a = player(&mut conn, "a").await;
        let now = Utc::now();

        let expires = now + chrono::Duration::days(7);
        let stored = store_refresh_token(&mut conn, a.id, "hash-1", now, expires).await.unwrap();
        assert!(stored.is_usable(now));

        let found = find_refresh_token(&mut conn, "hash-1").await.unwrap().unwrap();
        assert_eq!(found.player_id, a.id.to_string());

        assert!(revoke_refresh_token(&mut conn, "hash-1", now).await.unwrap());
        assert!(!revoke_refresh_token(&mut conn, "hash-1", now).await.unwrap());
        let revoked = find_refresh_token(&mut conn, "hash-1").await.unwrap().unwrap();
        assert!(!revoked.is_usable(now));

        assert!(find_refresh_token(&mut conn, "missing").await.unwrap().is_none());
    }
}

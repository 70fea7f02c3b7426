use sqlx::SqliteConnection;
use types::{Player, PlayerId};

use crate::models::PlayerRecord;
use crate::{DatabaseError, NewPlayer};

/// Inserts a player. A taken email or handle surfaces as
/// [`DatabaseError::Conflict`] and nothing is written.
pub async fn insert_player(
    conn: &mut SqliteConnection,
    player: &NewPlayer<'_>,
) -> Result<Player, DatabaseError> {
    sqlx::query(
        "INSERT INTO players (id, email, handle, display_name, password_hash, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(player.id.to_string())
    .bind(player.email)
    .bind(player.handle)
    .bind(player.display_name)
    .bind(player.password_hash)
    .bind(player.created_at)
    .execute(&mut *conn)
    .await?;

    get_player(conn, player.id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Player {}", player.id)))
}

pub async fn get_player(
    conn: &mut SqliteConnection,
    id: PlayerId,
) -> Result<Option<Player>, DatabaseError> {
    sqlx::query_as::<_, PlayerRecord>("SELECT * FROM players WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?
        .map(Player::try_from)
        .transpose()
}

pub async fn get_player_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<Player>, DatabaseError> {
    sqlx::query_as::<_, PlayerRecord>("SELECT * FROM players WHERE email = ?")
        .bind(email)
        .fetch_optional(conn)
        .await?
        .map(Player::try_from)
        .transpose()
}

pub async fn get_player_by_handle(
    conn: &mut SqliteConnection,
    handle: &str,
) -> Result<Option<Player>, DatabaseError> {
    sqlx::query_as::<_, PlayerRecord>("SELECT * FROM players WHERE handle = ?")
        .bind(handle)
        .fetch_optional(conn)
        .await?
        .map(Player::try_from)
        .transpose()
}

pub async fn player_exists(
    conn: &mut SqliteConnection,
    id: PlayerId,
) -> Result<bool, DatabaseError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM players WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{player, setup_test_db};
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_and_lookup_player() {
        let db = setup_test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let alpha = player(&mut conn, "alpha").await;

        let by_id = get_player(&mut conn, alpha.id).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&alpha));

        let by_email = get_player_by_email(&mut conn, "alpha@test.com").await.unwrap();
        assert_eq!(by_email.map(|p| p.id), Some(alpha.id));

        let by_handle = get_player_by_handle(&mut conn, "alpha").await.unwrap();
        assert_eq!(by_handle.map(|p| p.id), Some(alpha.id));

        assert!(player_exists(&mut conn, alpha.id).await.unwrap());
        assert!(!player_exists(&mut conn, PlayerId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_or_handle_conflicts() {
        let db = setup_test_db().await;
        let mut conn = db.acquire().await.unwrap();
        player(&mut conn, "dup").await;

        let same_email = NewPlayer {
            id: PlayerId::new(),
            email: "dup@test.com",
            handle: "dup2",
            display_name: "Dup 2",
            password_hash: None,
            created_at: Utc::now(),
        };
        let err = insert_player(&mut conn, &same_email).await.unwrap_err();
        assert!(err.is_conflict(), "{err:?}");

        let same_handle = NewPlayer {
            email: "other@test.com",
            handle: "dup",
            ..same_email
        };
        let err = insert_player(&mut conn, &same_handle).await.unwrap_err();
        assert!(err.is_conflict(), "{err:?}");

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}

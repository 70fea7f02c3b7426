use sqlx::SqliteConnection;
use types::{Game, GameId, MatchId, PlayerId};

use crate::models::GameRecord;
use crate::{DatabaseError, NewGame};

pub async fn insert_game(
    conn: &mut SqliteConnection,
    new: &NewGame,
) -> Result<Game, DatabaseError> {
    let record = sqlx::query_as::<_, GameRecord>(
        "INSERT INTO games (match_id, game_type, winner_id, loser_id, frame_number, created_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(new.match_id.as_i64())
    .bind(new.game_type.as_str())
    .bind(new.winner_id.to_string())
    .bind(new.loser_id.to_string())
    .bind(new.frame_number.map(i64::from))
    .bind(new.created_at)
    .fetch_one(conn)
    .await?;

    Game::try_from(record)
}

pub async fn get_game(
    conn: &mut SqliteConnection,
    id: GameId,
) -> Result<Option<Game>, DatabaseError> {
    sqlx::query_as::<_, GameRecord>("SELECT * FROM games WHERE id = ?")
        .bind(id.as_i64())
        .fetch_optional(conn)
        .await?
        .map(Game::try_from)
        .transpose()
}

/// Games of a match in the order they were recorded.
pub async fn games_for_match(
    conn: &mut SqliteConnection,
    match_id: MatchId,
) -> Result<Vec<Game>, DatabaseError> {
    sqlx::query_as::<_, GameRecord>("SELECT * FROM games WHERE match_id = ? ORDER BY id ASC")
        .bind(match_id.as_i64())
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(Game::try_from)
        .collect()
}

pub async fn update_game_result(
    conn: &mut SqliteConnection,
    id: GameId,
    winner_id: PlayerId,
    loser_id: PlayerId,
) -> Result<Option<Game>, DatabaseError> {
    sqlx::query_as::<_, GameRecord>(
        "UPDATE games SET winner_id = ?, loser_id = ? WHERE id = ? RETURNING *",
    )
    .bind(winner_id.to_string())
    .bind(loser_id.to_string())
    .bind(id.as_i64())
    .fetch_optional(conn)
    .await?
    .map(Game::try_from)
    .transpose()
}

pub async fn delete_game(conn: &mut SqliteConnection, id: GameId) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM games WHERE id = ?")
        .bind(id.as_i64())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count_games(
    conn: &mut SqliteConnection,
    match_id: MatchId,
) -> Result<i64, DatabaseError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM games WHERE match_id = ?")
        .bind(match_id.as_i64())
        .fetch_one(conn)
        .await?;
    Ok(count)
}

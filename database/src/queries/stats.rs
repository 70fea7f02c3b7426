use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use types::{GameType, MatchId, MatchStatus, PlayerId, StatPeriod, StatSnapshot};

use crate::models::StatRecord;
use crate::{DatabaseError, RackResult};

/// Every game of every approved match `player` took part in, one row per
/// game, plus one row with no winner for each approved match without games.
pub async fn approved_results_for(
    conn: &mut SqliteConnection,
    player: PlayerId,
    game_type: Option<GameType>,
) -> Result<Vec<RackResult>, DatabaseError> {
    let player = player.to_string();
    let rows = sqlx::query(
        "SELECT m.id AS match_id, m.game_type AS game_type, m.created_at AS played_at,
                g.winner_id AS winner_id
         FROM matches m
         LEFT JOIN games g ON g.match_id = m.id
         WHERE m.status = ?
           AND (m.creator_id = ? OR m.opponent_id = ?)
           AND (? IS NULL OR m.game_type = ?)
         ORDER BY m.id ASC, g.id ASC",
    )
    .bind(MatchStatus::Approved.as_str())
    .bind(&player)
    .bind(&player)
    .bind(game_type.map(GameType::as_str))
    .bind(game_type.map(GameType::as_str))
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<RackResult, DatabaseError> {
            let game_type: String = row.try_get("game_type")?;
            let played_at: DateTime<Utc> = row.try_get("played_at")?;
            let winner_id: Option<String> = row.try_get("winner_id")?;
            Ok(RackResult {
                match_id: MatchId::new(row.try_get("match_id")?),
                game_type: game_type.parse()?,
                played_at,
                winner_id: winner_id.map(|id| id.parse()).transpose()?,
            })
        })
        .collect()
}

pub async fn get_snapshot(
    conn: &mut SqliteConnection,
    player: PlayerId,
    game_type: GameType,
    period: StatPeriod,
) -> Result<Option<StatSnapshot>, DatabaseError> {
    let (start, end) = period.bounds();
    sqlx::query_as::<_, StatRecord>(
        "SELECT player_id, game_type, period_start, period_end, matches_played, wins, losses,
                racks_won, racks_lost, updated_at
         FROM stats
         WHERE player_id = ? AND game_type = ? AND period_start IS ? AND period_end IS ?",
    )
    .bind(player.to_string())
    .bind(game_type.as_str())
    .bind(start)
    .bind(end)
    .fetch_optional(conn)
    .await?
    .map(StatSnapshot::try_from)
    .transpose()
}

/// Writes `snapshot` over the row for its (player, game type, period) bucket,
/// inserting the row if it doesn't exist yet.
pub async fn upsert_snapshot(
    conn: &mut SqliteConnection,
    snapshot: &StatSnapshot,
) -> Result<(), DatabaseError> {
    let (start, end) = snapshot.period.bounds();
    let updated = sqlx::query(
        "UPDATE stats SET matches_played = ?, wins = ?, losses = ?, racks_won = ?, racks_lost = ?,
                          updated_at = ?
         WHERE player_id = ? AND game_type = ? AND period_start IS ? AND period_end IS ?",
    )
    .bind(i64::from(snapshot.matches_played))
    .bind(i64::from(snapshot.wins))
    .bind(i64::from(snapshot.losses))
    .bind(i64::from(snapshot.racks_won))
    .bind(i64::from(snapshot.racks_lost))
    .bind(snapshot.updated_at)
    .bind(snapshot.player_id.to_string())
    .bind(snapshot.game_type.as_str())
    .bind(start)
    .bind(end)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() > 0 {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO stats (player_id, game_type, period_start, period_end, matches_played,
                            wins, losses, racks_won, racks_lost, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(snapshot.player_id.to_string())
    .bind(snapshot.game_type.as_str())
    .bind(start)
    .bind(end)
    .bind(i64::from(snapshot.matches_played))
    .bind(i64::from(snapshot.wins))
    .bind(i64::from(snapshot.losses))
    .bind(i64::from(snapshot.racks_won))
    .bind(i64::from(snapshot.racks_lost))
    .bind(snapshot.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// All-time snapshots for `game_type`, most racks won first.
pub async fn leaderboard(
    conn: &mut SqliteConnection,
    game_type: GameType,
    limit: u32,
) -> Result<Vec<StatSnapshot>, DatabaseError> {
    sqlx::query_as::<_, StatRecord>(
        "SELECT player_id, game_type, period_start, period_end, matches_played, wins, losses,
                racks_won, racks_lost, updated_at
         FROM stats
         WHERE game_type = ? AND period_start IS NULL AND period_end IS NULL
         ORDER BY racks_won DESC, racks_lost ASC, player_id ASC
         LIMIT ?",
    )
    .bind(game_type.as_str())
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await?
    .into_iter()
    .map(StatSnapshot::try_from)
    .collect()
}

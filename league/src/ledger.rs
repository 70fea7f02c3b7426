//! Low-level game records.
//!
//! The ledger checks only what a game row needs to be well formed: the match
//! exists and the winner isn't also the loser. Who may write and whether the
//! match still takes games is decided by [`crate::MatchService`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use database::queries::{games, matches};
use database::{commit, Database, NewGame};
use sqlx::SqliteConnection;
use types::{Clock, Game, GameId, GameType, MatchId, PlayerId};

use crate::LeagueError;

#[derive(Clone)]
pub struct GameLedger {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl GameLedger {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn add_game(
        &self,
        match_id: MatchId,
        winner_id: PlayerId,
        loser_id: PlayerId,
        game_type: GameType,
        frame_number: Option<u32>,
    ) -> Result<Game, LeagueError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let game =
            Self::insert(&mut tx, match_id, winner_id, loser_id, game_type, frame_number, now)
                .await?;
        commit(tx).await?;
        Ok(game)
    }

    pub async fn edit_game(
        &self,
        game_id: GameId,
        winner_id: PlayerId,
        loser_id: PlayerId,
    ) -> Result<Game, LeagueError> {
        let mut tx = self.db.begin().await?;
        let game = Self::update(&mut tx, game_id, winner_id, loser_id).await?;
        commit(tx).await?;
        Ok(game)
    }

    pub async fn delete_game(&self, game_id: GameId) -> Result<Game, LeagueError> {
        let mut tx = self.db.begin().await?;
        let game = Self::remove(&mut tx, game_id).await?;
        commit(tx).await?;
        Ok(game)
    }

    pub async fn get_game(&self, game_id: GameId) -> Result<Game, LeagueError> {
        let mut conn = self.db.acquire().await?;
        Self::fetch(&mut conn, game_id).await
    }

    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        match_id: MatchId,
        winner_id: PlayerId,
        loser_id: PlayerId,
        game_type: GameType,
        frame_number: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Game, LeagueError> {
        distinct_players(winner_id, loser_id)?;
        if matches::get_match(&mut *conn, match_id).await?.is_none() {
            return Err(LeagueError::NotFound(format!("match {match_id}")));
        }
        let game = games::insert_game(
            conn,
            &NewGame {
                match_id,
                game_type,
                winner_id,
                loser_id,
                frame_number,
                created_at: now,
            },
        )
        .await?;
        log::debug!("recorded game {} in match {match_id}", game.id);
        Ok(game)
    }

    pub(crate) async fn update(
        conn: &mut SqliteConnection,
        game_id: GameId,
        winner_id: PlayerId,
        loser_id: PlayerId,
    ) -> Result<Game, LeagueError> {
        distinct_players(winner_id, loser_id)?;
        games::update_game_result(conn, game_id, winner_id, loser_id)
            .await?
            .ok_or_else(|| LeagueError::NotFound(format!("game {game_id}")))
    }

    pub(crate) async fn remove(
        conn: &mut SqliteConnection,
        game_id: GameId,
    ) -> Result<Game, LeagueError> {
        let game = Self::fetch(&mut *conn, game_id).await?;
        if !games::delete_game(conn, game_id).await? {
            return Err(LeagueError::NotFound(format!("game {game_id}")));
        }
        Ok(game)
    }

    pub(crate) async fn fetch(
        conn: &mut SqliteConnection,
        game_id: GameId,
    ) -> Result<Game, LeagueError> {
        games::get_game(conn, game_id)
            .await?
            .ok_or_else(|| LeagueError::NotFound(format!("game {game_id}")))
    }
}

fn distinct_players(winner_id: PlayerId, loser_id: PlayerId) -> Result<(), LeagueError> {
    if winner_id == loser_id {
        return Err(LeagueError::InvalidArgument(
            "winner and loser must be different players".to_string(),
        ));
    }
    Ok(())
}

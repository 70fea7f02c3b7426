//! The match lifecycle.
//!
//! Every mutating operation runs in one transaction that first re-reads the
//! match under the write lock, then checks, in order: the match exists, its
//! status allows the operation, the acting player holds the required role,
//! and finally the arguments. A failed check returns before anything is
//! written.

use std::sync::Arc;

use database::queries::{approvals, games, matches};
use database::{commit, Database, MatchQuery, NewMatch, Tx};
use serde::Serialize;
use types::{
    Approval, ApprovalStatus, Clock, Game, GameId, GameType, Match, MatchId, MatchStatus,
    PlayerId, PlayerLookup, Role, StatPeriod, Transition,
};

use crate::{GameLedger, LeagueError, StatsService};

/// A match as seen by one of its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchDetail {
    #[serde(rename = "match")]
    pub match_: Match,
    /// In recording order, with missing frame numbers filled in from position.
    pub games: Vec<Game>,
    pub approval: Option<Approval>,
}

impl MatchDetail {
    /// Racks won by `player` in this match.
    pub fn racks_won_by(&self, player: PlayerId) -> usize {
        self.games.iter().filter(|g| g.winner_id == player).count()
    }
}

/// Filters for [`MatchService::list`]. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFilter {
    participant: Option<PlayerId>,
    game_type: Option<GameType>,
    status: Option<MatchStatus>,
}

impl MatchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches where `player` is the creator or the opponent.
    pub fn participant(mut self, player: PlayerId) -> Self {
        self.participant = Some(player);
        self
    }

    pub fn game_type(mut self, game_type: GameType) -> Self {
        self.game_type = Some(game_type);
        self
    }

    pub fn status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<MatchFilter> for MatchQuery {
    fn from(filter: MatchFilter) -> Self {
        MatchQuery {
            participant: filter.participant,
            game_type: filter.game_type,
            status: filter.status,
        }
    }
}

#[derive(Clone)]
pub struct MatchService<P> {
    db: Database,
    players: P,
    clock: Arc<dyn Clock>,
}

impl<P> MatchService<P>
where
    P: PlayerLookup,
{
    pub fn new(db: Database, players: P, clock: Arc<dyn Clock>) -> Self {
        Self { db, players, clock }
    }

    pub async fn create(
        &self,
        creator_id: PlayerId,
        opponent_id: PlayerId,
        game_type: GameType,
        race_to: i64,
    ) -> Result<Match, LeagueError> {
        if creator_id == opponent_id {
            return Err(LeagueError::InvalidArgument(
                "a player can't play a match against themselves".to_string(),
            ));
        }
        let race_to = u32::try_from(race_to)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                LeagueError::InvalidArgument(format!("race-to must be positive, got {race_to}"))
            })?;
        for id in [creator_id, opponent_id] {
            let known = self
                .players
                .exists(id)
                .await
                .map_err(|e| LeagueError::Unavailable(Box::new(e)))?;
            if !known {
                return Err(LeagueError::NotFound(format!("player {id}")));
            }
        }

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let created = matches::insert_match(
            &mut tx,
            &NewMatch {
                creator_id,
                opponent_id,
                game_type,
                race_to,
                created_at: now,
            },
        )
        .await?;
        approvals::request_approval(&mut tx, created.id, opponent_id).await?;
        commit(tx).await?;

        log::info!(
            "match {} created: {creator_id} vs {opponent_id}, {game_type} race to {race_to}",
            created.id
        );
        Ok(created)
    }

    /// Records one rack. The game's type must be the match's type.
    pub async fn add_game(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
        winner_id: PlayerId,
        loser_id: PlayerId,
        game_type: GameType,
    ) -> Result<Game, LeagueError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let current = self.lock_for_games(&mut tx, match_id, acting_id, now).await?;
        check_pairing(&current, winner_id, loser_id)?;
        if game_type != current.game_type {
            return Err(LeagueError::InvalidArgument(format!(
                "match {match_id} is {}, not {game_type}",
                current.game_type
            )));
        }
        let game =
            GameLedger::insert(&mut tx, match_id, winner_id, loser_id, game_type, None, now)
                .await?;
        commit(tx).await?;
        Ok(game)
    }

    pub async fn edit_game(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
        game_id: GameId,
        winner_id: PlayerId,
        loser_id: PlayerId,
    ) -> Result<Game, LeagueError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let current = self.lock_for_games(&mut tx, match_id, acting_id, now).await?;
        check_pairing(&current, winner_id, loser_id)?;
        check_membership(&GameLedger::fetch(&mut tx, game_id).await?, match_id)?;
        let game = GameLedger::update(&mut tx, game_id, winner_id, loser_id).await?;
        commit(tx).await?;
        log::debug!("game {game_id} in match {match_id} edited by {acting_id}");
        Ok(game)
    }

    pub async fn delete_game(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
        game_id: GameId,
    ) -> Result<Game, LeagueError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        self.lock_for_games(&mut tx, match_id, acting_id, now).await?;
        check_membership(&GameLedger::fetch(&mut tx, game_id).await?, match_id)?;
        let game = GameLedger::remove(&mut tx, game_id).await?;
        commit(tx).await?;
        log::debug!("game {game_id} in match {match_id} deleted by {acting_id}");
        Ok(game)
    }

    /// The creator marks the match ready for review. Pending matches are
    /// always open to the opponent's decision, so this only checks that there
    /// is something to review; the status doesn't change.
    pub async fn submit(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
    ) -> Result<Match, LeagueError> {
        let mut conn = self.db.acquire().await?;
        let current = load(&mut conn, match_id).await?;
        if !current.status.accepts_games() {
            return Err(invalid_state(&current, "submit"));
        }
        require_role(&current, acting_id, Role::Creator, "submit")?;
        if games::count_games(&mut conn, match_id).await? == 0 {
            return Err(LeagueError::InvalidState(format!(
                "match {match_id} has no games to submit"
            )));
        }
        log::info!("match {match_id} submitted for review by {acting_id}");
        Ok(current)
    }

    pub async fn approve(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
        note: &str,
    ) -> Result<Match, LeagueError> {
        self.transition(acting_id, match_id, Transition::Approve, note).await
    }

    pub async fn decline(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
        note: &str,
    ) -> Result<Match, LeagueError> {
        self.transition(acting_id, match_id, Transition::Decline, note).await
    }

    /// The creator calls the match off. The opponent's undecided approval
    /// request is withdrawn with it.
    pub async fn cancel(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
    ) -> Result<Match, LeagueError> {
        self.transition(acting_id, match_id, Transition::Cancel, "").await
    }

    /// Removes a pending match together with its games and approval request.
    /// Either participant may do this.
    pub async fn delete(&self, acting_id: PlayerId, match_id: MatchId) -> Result<(), LeagueError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let current = lock(&mut tx, match_id, now).await?;
        if !current.status.accepts_games() {
            return Err(invalid_state(&current, "delete"));
        }
        require_participant(&current, acting_id)?;
        if !matches::delete_match_if_pending(&mut tx, match_id).await? {
            return Err(invalid_state(&current, "delete"));
        }
        commit(tx).await?;
        log::info!("match {match_id} deleted by {acting_id}");
        Ok(())
    }

    /// Fails with [`LeagueError::Authorization`] for non-participants; use
    /// [`MatchService::get_visible`] to report that as not found instead.
    pub async fn get(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
    ) -> Result<MatchDetail, LeagueError> {
        let mut conn = self.db.acquire().await?;
        let current = load(&mut conn, match_id).await?;
        require_participant(&current, acting_id)?;

        let mut games = games::games_for_match(&mut conn, match_id).await?;
        for (position, game) in games.iter_mut().enumerate() {
            if game.frame_number.is_none() {
                game.frame_number = u32::try_from(position + 1).ok();
            }
        }
        let approval = approvals::get_approval(&mut conn, match_id).await?;

        Ok(MatchDetail {
            match_: current,
            games,
            approval,
        })
    }

    pub async fn get_visible(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
    ) -> Result<MatchDetail, LeagueError> {
        self.get(acting_id, match_id)
            .await
            .map_err(|e| e.hide_forbidden(format!("match {match_id}")))
    }

    /// Newest first.
    pub async fn list(&self, filter: MatchFilter) -> Result<Vec<Match>, LeagueError> {
        let mut conn = self.db.acquire().await?;
        Ok(matches::list_matches(&mut conn, &filter.into()).await?)
    }

    async fn transition(
        &self,
        acting_id: PlayerId,
        match_id: MatchId,
        transition: Transition,
        note: &str,
    ) -> Result<Match, LeagueError> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let current = lock(&mut tx, match_id, now).await?;
        let next = current
            .status
            .apply(transition)
            .ok_or_else(|| invalid_state(&current, &transition.to_string()))?;
        require_role(&current, acting_id, transition.required_role(), &transition.to_string())?;

        if !matches::set_status_if_pending(&mut tx, match_id, next, now).await? {
            return Err(invalid_state(&current, &transition.to_string()));
        }
        match ApprovalStatus::for_match_status(next) {
            Some(decision) => {
                record_decision(&mut tx, &current, decision, note, now).await?;
            }
            // a cancelled match no longer asks the opponent for anything
            None => {
                approvals::withdraw_request(&mut tx, match_id).await?;
            }
        }

        let updated = Match {
            status: next,
            updated_at: now,
            ..current
        };
        if next == MatchStatus::Approved {
            for player in [updated.creator_id, updated.opponent_id] {
                for period in [StatPeriod::AllTime, StatPeriod::month_of(updated.created_at)] {
                    StatsService::refresh_in(&mut tx, player, updated.game_type, period, now)
                        .await?;
                }
            }
        }
        commit(tx).await?;

        log::info!("match {match_id}: {transition} by {acting_id}, now {next}");
        Ok(updated)
    }

    async fn lock_for_games(
        &self,
        tx: &mut Tx,
        match_id: MatchId,
        acting_id: PlayerId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Match, LeagueError> {
        let current = lock(tx, match_id, now).await?;
        if !current.status.accepts_games() {
            return Err(invalid_state(&current, "change games of"));
        }
        require_participant(&current, acting_id)?;
        Ok(current)
    }
}

async fn lock(
    tx: &mut Tx,
    match_id: MatchId,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Match, LeagueError> {
    matches::lock_match(tx, match_id, now)
        .await?
        .ok_or_else(|| LeagueError::NotFound(format!("match {match_id}")))
}

async fn load(conn: &mut sqlx::SqliteConnection, match_id: MatchId) -> Result<Match, LeagueError> {
    matches::get_match(conn, match_id)
        .await?
        .ok_or_else(|| LeagueError::NotFound(format!("match {match_id}")))
}

async fn record_decision(
    tx: &mut Tx,
    current: &Match,
    decision: ApprovalStatus,
    note: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Approval, LeagueError> {
    approvals::record_decision(tx, current.id, current.opponent_id, decision, note, now)
        .await?
        .ok_or_else(|| LeagueError::Conflict(format!("match {} was already decided", current.id)))
}

fn invalid_state(current: &Match, action: &str) -> LeagueError {
    log::debug!("rejected {action} on match {}: status {}", current.id, current.status);
    LeagueError::InvalidState(format!(
        "can't {action} match {} while it is {}",
        current.id, current.status
    ))
}

fn require_participant(current: &Match, acting_id: PlayerId) -> Result<Role, LeagueError> {
    current.role_of(acting_id).ok_or_else(|| {
        log::debug!("{acting_id} is not a participant of match {}", current.id);
        LeagueError::Authorization(format!("not a participant of match {}", current.id))
    })
}

fn require_role(
    current: &Match,
    acting_id: PlayerId,
    required: Role,
    action: &str,
) -> Result<(), LeagueError> {
    if require_participant(current, acting_id)? != required {
        log::debug!(
            "{acting_id} tried to {action} match {} without being its {required}",
            current.id
        );
        return Err(LeagueError::Authorization(format!(
            "only the {required} can {action} match {}",
            current.id
        )));
    }
    Ok(())
}

fn check_pairing(
    current: &Match,
    winner_id: PlayerId,
    loser_id: PlayerId,
) -> Result<(), LeagueError> {
    if winner_id == loser_id {
        return Err(LeagueError::InvalidArgument(
            "winner and loser must be different players".to_string(),
        ));
    }
    if !current.is_pairing(winner_id, loser_id) {
        return Err(LeagueError::InvalidArgument(format!(
            "games in match {} must be between its two participants",
            current.id
        )));
    }
    Ok(())
}

fn check_membership(game: &Game, match_id: MatchId) -> Result<(), LeagueError> {
    if game.match_id != match_id {
        return Err(LeagueError::InvalidArgument(format!(
            "game {} belongs to match {}, not {match_id}",
            game.id, game.match_id
        )));
    }
    Ok(())
}

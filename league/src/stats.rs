use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use database::queries::{players, stats};
use database::{Database, RackResult};
use itertools::Itertools;
use sqlx::SqliteConnection;
use types::{Clock, GameType, PlayerId, StatPeriod, StatSnapshot};

use crate::LeagueError;

/// Counters over approved matches.
///
/// [`StatsService::summary`] always recomputes from match and game rows.
/// Stored snapshots are refreshed when a match is approved and back
/// [`StatsService::snapshot`] and [`StatsService::leaderboard`].
#[derive(Clone)]
pub struct StatsService {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// All-time counters for `player`, one per game type they have approved
    /// matches in, or just the requested type. Ordered by game type.
    pub async fn summary(
        &self,
        player: PlayerId,
        game_type: Option<GameType>,
    ) -> Result<Vec<StatSnapshot>, LeagueError> {
        let mut conn = self.db.acquire().await?;
        if !players::player_exists(&mut conn, player).await? {
            return Err(LeagueError::NotFound(format!("player {player}")));
        }
        let results = stats::approved_results_for(&mut conn, player, game_type).await?;
        let now = self.clock.now();

        let types: Vec<GameType> = match game_type {
            Some(t) => vec![t],
            None => results.iter().map(|r| r.game_type).unique().sorted().collect(),
        };
        Ok(types
            .into_iter()
            .map(|t| tally(player, &results, t, StatPeriod::AllTime, now))
            .collect())
    }

    /// The stored snapshot for one bucket. A bucket never written reads as zeros.
    pub async fn snapshot(
        &self,
        player: PlayerId,
        game_type: GameType,
        period: StatPeriod,
    ) -> Result<StatSnapshot, LeagueError> {
        let mut conn = self.db.acquire().await?;
        let stored = stats::get_snapshot(&mut conn, player, game_type, period).await?;
        Ok(stored
            .unwrap_or_else(|| StatSnapshot::empty(player, game_type, period, self.clock.now())))
    }

    /// Recomputes and stores one bucket.
    pub async fn refresh(
        &self,
        player: PlayerId,
        game_type: GameType,
        period: StatPeriod,
    ) -> Result<StatSnapshot, LeagueError> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now();
        let snapshot = Self::refresh_in(&mut tx, player, game_type, period, now).await?;
        database::commit(tx).await?;
        Ok(snapshot)
    }

    /// All-time standings for `game_type` by racks won.
    pub async fn leaderboard(
        &self,
        game_type: GameType,
        limit: u32,
    ) -> Result<Vec<StatSnapshot>, LeagueError> {
        let mut conn = self.db.acquire().await?;
        Ok(stats::leaderboard(&mut conn, game_type, limit).await?)
    }

    pub(crate) async fn refresh_in(
        conn: &mut SqliteConnection,
        player: PlayerId,
        game_type: GameType,
        period: StatPeriod,
        now: DateTime<Utc>,
    ) -> Result<StatSnapshot, LeagueError> {
        let results = stats::approved_results_for(&mut *conn, player, Some(game_type)).await?;
        let snapshot = tally(player, &results, game_type, period, now);
        stats::upsert_snapshot(conn, &snapshot).await?;
        log::debug!(
            "stats for {player} ({game_type}, {:?}) refreshed: {}-{}",
            period,
            snapshot.racks_won,
            snapshot.racks_lost
        );
        Ok(snapshot)
    }
}

/// Folds approved results into one bucket. Only rows of `game_type` whose
/// match falls in `period` count; a row with no winner is a match without
/// games and only adds to `matches_played`.
pub fn tally(
    player: PlayerId,
    results: &[RackResult],
    game_type: GameType,
    period: StatPeriod,
    now: DateTime<Utc>,
) -> StatSnapshot {
    let mut snapshot = StatSnapshot::empty(player, game_type, period, now);
    let mut seen = HashSet::new();
    for result in results
        .iter()
        .filter(|r| r.game_type == game_type && period.contains(r.played_at))
    {
        if seen.insert(result.match_id) {
            snapshot.matches_played += 1;
        }
        match result.winner_id {
            Some(winner) if winner == player => {
                snapshot.wins += 1;
                snapshot.racks_won += 1;
            }
            Some(_) => {
                snapshot.losses += 1;
                snapshot.racks_lost += 1;
            }
            None => {}
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{league, Fixture};
    use chrono::{Duration, TimeZone};
    use types::MatchId;

    fn result(
        match_id: i64,
        game_type: GameType,
        played_at: DateTime<Utc>,
        winner: Option<PlayerId>,
    ) -> RackResult {
        RackResult {
            match_id: MatchId::new(match_id),
            game_type,
            played_at,
            winner_id: winner,
        }
    }

    #[test]
    fn tally_counts_racks_and_distinct_matches() {
        let me = PlayerId::new();
        let them = PlayerId::new();
        let now = Utc::now();
        let results = vec![
            result(1, GameType::EightBall, now, Some(me)),
            result(1, GameType::EightBall, now, Some(them)),
            result(2, GameType::EightBall, now, Some(me)),
            result(3, GameType::EightBall, now, None),
            result(4, GameType::NineBall, now, Some(me)),
        ];

        let s = tally(me, &results, GameType::EightBall, StatPeriod::AllTime, now);
        assert_eq!(s.matches_played, 3);
        assert_eq!((s.wins, s.losses), (2, 1));
        assert_eq!((s.racks_won, s.racks_lost), (2, 1));
    }

    #[test]
    fn tally_respects_period() {
        let me = PlayerId::new();
        let march = Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2025, 4, 2, 20, 0, 0).unwrap();
        let results = vec![
            result(1, GameType::TenBall, march, Some(me)),
            result(2, GameType::TenBall, april, Some(me)),
        ];

        let s = tally(me, &results, GameType::TenBall, StatPeriod::month_of(march), april);
        assert_eq!(s.matches_played, 1);
        assert_eq!(s.racks_won, 1);
    }

    #[tokio::test]
    async fn test_summary_ignores_unapproved_and_foreign_matches() {
        let Fixture { league, alice, bob, carol, .. } = league().await;
        let matches = &league.matches;
        let nine = GameType::NineBall;

        let approved = matches.create(alice.id, bob.id, nine, 3).await.unwrap();
        matches.add_game(alice.id, approved.id, alice.id, bob.id, nine).await.unwrap();
        matches.approve(bob.id, approved.id, "").await.unwrap();

        let pending = matches.create(alice.id, bob.id, nine, 3).await.unwrap();
        matches.add_game(alice.id, pending.id, bob.id, alice.id, nine).await.unwrap();

        let others = matches.create(bob.id, carol.id, nine, 3).await.unwrap();
        matches.add_game(bob.id, others.id, carol.id, bob.id, nine).await.unwrap();
        matches.approve(carol.id, others.id, "").await.unwrap();

        let summary = league.stats.summary(alice.id, None).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].game_type, nine);
        assert_eq!(summary[0].matches_played, 1);
        assert_eq!((summary[0].wins, summary[0].losses), (1, 0));

        let empty = league.stats.summary(carol.id, Some(GameType::EightBall)).await.unwrap();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].matches_played, 0);
    }

    #[tokio::test]
    async fn test_summary_unknown_player() {
        let Fixture { league, .. } = league().await;
        let missing = league.stats.summary(PlayerId::new(), None).await;
        assert!(matches!(missing, Err(LeagueError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_approval_refreshes_stored_snapshots() {
        let Fixture { league, alice, bob, clock, .. } = league().await;
        let eight = GameType::EightBall;

        let m = league.matches.create(alice.id, bob.id, eight, 2).await.unwrap();
        for _ in 0..2 {
            league.matches.add_game(bob.id, m.id, bob.id, alice.id, eight).await.unwrap();
        }

        let before = league.stats.snapshot(bob.id, eight, StatPeriod::AllTime).await.unwrap();
        assert_eq!(before.racks_won, 0);

        clock.advance(Duration::hours(1));
        league.matches.approve(bob.id, m.id, "gg").await.unwrap();

        for period in [StatPeriod::AllTime, StatPeriod::month_of(m.created_at)] {
            let bob_stats = league.stats.snapshot(bob.id, eight, period).await.unwrap();
            assert_eq!(bob_stats.matches_played, 1);
            assert_eq!((bob_stats.racks_won, bob_stats.racks_lost), (2, 0));
            assert_eq!(bob_stats.updated_at, clock.now());
        }

        let board = league.stats.leaderboard(eight, 10).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].player_id, bob.id);
        assert_eq!(board[1].player_id, alice.id);
        assert_eq!(board[1].racks_lost, 2);

        let refreshed = league.stats.refresh(alice.id, eight, StatPeriod::AllTime).await.unwrap();
        assert_eq!(refreshed, board[1]);
    }
}

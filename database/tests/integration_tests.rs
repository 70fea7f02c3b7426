//! Storage-level guarantees checked against a real database file: the
//! constraints hold even when application checks are bypassed.

use chrono::Utc;
use database::queries::{approvals, games, matches, players, stats};
use database::{commit, Database, DatabaseConfig, DatabaseError, NewGame, NewMatch, NewPlayer};
use sqlx::SqliteConnection;
use types::{
    ApprovalStatus, GameType, MatchId, MatchStatus, Player, PlayerId, StatPeriod, StatSnapshot,
};

async fn open_file_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = DatabaseConfig::new(dir.path().join("league.db").display().to_string());
    let db = Database::connect(&config).await.expect("Failed to open database");
    (db, dir)
}

async fn player(conn: &mut SqliteConnection, handle: &str) -> Player {
    let email = format!("{handle}@test.com");
    players::insert_player(
        conn,
        &NewPlayer {
            id: PlayerId::new(),
            email: &email,
            handle,
            display_name: handle,
            password_hash: None,
            created_at: Utc::now(),
        },
    )
    .await
    .expect("Failed to insert player")
}

fn new_match(a: &Player, b: &Player) -> NewMatch {
    NewMatch {
        creator_id: a.id,
        opponent_id: b.id,
        game_type: GameType::NineBall,
        race_to: 7,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_reopening_keeps_data_and_migrations_are_idempotent() {
    let (db, dir) = open_file_db().await;
    let mut conn = db.acquire().await.unwrap();
    let a = player(&mut conn, "a").await;
    drop(conn);
    db.pool().close().await;

    let config = DatabaseConfig::new(dir.path().join("league.db").display().to_string());
    let reopened = Database::connect(&config).await.unwrap();
    reopened.run_migrations().await.unwrap();
    let mut conn = reopened.acquire().await.unwrap();
    let stored = players::get_player(&mut conn, a.id).await.unwrap();
    assert_eq!(stored.map(|p| p.handle), Some("a".to_string()));
}

#[tokio::test]
async fn test_constraints_reject_malformed_rows() {
    let (db, _dir) = open_file_db().await;
    let mut conn = db.acquire().await.unwrap();
    let a = player(&mut conn, "a").await;
    let b = player(&mut conn, "b").await;

    let self_match = matches::insert_match(&mut conn, &new_match(&a, &a)).await;
    assert!(matches!(self_match, Err(DatabaseError::Query(_))));

    let orphan = games::insert_game(
        &mut conn,
        &NewGame {
            match_id: MatchId::new(12345),
            game_type: GameType::NineBall,
            winner_id: a.id,
            loser_id: b.id,
            frame_number: None,
            created_at: Utc::now(),
        },
    )
    .await;
    assert!(orphan.is_err(), "foreign keys must be enforced");

    let m = matches::insert_match(&mut conn, &new_match(&a, &b)).await.unwrap();
    let same_player = games::insert_game(
        &mut conn,
        &NewGame {
            match_id: m.id,
            game_type: GameType::NineBall,
            winner_id: a.id,
            loser_id: a.id,
            frame_number: None,
            created_at: Utc::now(),
        },
    )
    .await;
    assert!(same_player.is_err());
}

#[tokio::test]
async fn test_one_approval_row_per_match() {
    let (db, _dir) = open_file_db().await;
    let mut conn = db.acquire().await.unwrap();
    let a = player(&mut conn, "a").await;
    let b = player(&mut conn, "b").await;
    let m = matches::insert_match(&mut conn, &new_match(&a, &b)).await.unwrap();

    approvals::request_approval(&mut conn, m.id, b.id).await.unwrap();
    let again = approvals::request_approval(&mut conn, m.id, b.id).await;
    assert!(matches!(again, Err(DatabaseError::Conflict(_))));

    let decided =
        approvals::record_decision(&mut conn, m.id, b.id, ApprovalStatus::Declined, "", Utc::now())
            .await
            .unwrap();
    assert!(decided.is_some());
    let twice =
        approvals::record_decision(&mut conn, m.id, b.id, ApprovalStatus::Approved, "", Utc::now())
            .await
            .unwrap();
    assert!(twice.is_none());
}

#[tokio::test]
async fn test_guarded_status_write_applies_once() {
    let (db, _dir) = open_file_db().await;
    let mut conn = db.acquire().await.unwrap();
    let a = player(&mut conn, "a").await;
    let b = player(&mut conn, "b").await;
    let m = matches::insert_match(&mut conn, &new_match(&a, &b)).await.unwrap();
    drop(conn);

    let mut first = db.begin().await.unwrap();
    let won = matches::set_status_if_pending(&mut first, m.id, MatchStatus::Approved, Utc::now());
    assert!(won.await.unwrap());
    commit(first).await.unwrap();

    let mut second = db.begin().await.unwrap();
    let lost = matches::set_status_if_pending(&mut second, m.id, MatchStatus::Declined, Utc::now());
    assert!(!lost.await.unwrap());
    commit(second).await.unwrap();

    let mut conn = db.acquire().await.unwrap();
    let stored = matches::get_match(&mut conn, m.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MatchStatus::Approved);
}

#[tokio::test]
async fn test_rolled_back_transaction_leaves_nothing() {
    let (db, _dir) = open_file_db().await;
    let mut conn = db.acquire().await.unwrap();
    let a = player(&mut conn, "a").await;
    let b = player(&mut conn, "b").await;
    drop(conn);

    let mut tx = db.begin().await.unwrap();
    let m = matches::insert_match(&mut tx, &new_match(&a, &b)).await.unwrap();
    drop(tx);

    let mut conn = db.acquire().await.unwrap();
    assert!(matches::get_match(&mut conn, m.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_snapshot_buckets_are_unique() {
    let (db, _dir) = open_file_db().await;
    let mut conn = db.acquire().await.unwrap();
    let a = player(&mut conn, "a").await;
    let now = Utc::now();

    for period in [StatPeriod::AllTime, StatPeriod::month_of(now)] {
        let mut snapshot = StatSnapshot::empty(a.id, GameType::TenBall, period, now);
        stats::upsert_snapshot(&mut conn, &snapshot).await.unwrap();
        snapshot.racks_won = 3;
        stats::upsert_snapshot(&mut conn, &snapshot).await.unwrap();
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stats")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let duplicate_all_time = sqlx::query(
        "INSERT INTO stats (player_id, game_type, period_start, period_end, matches_played,
                            wins, losses, racks_won, racks_lost, updated_at)
         VALUES (?, 'TEN_BALL', NULL, NULL, 0, 0, 0, 0, 0, ?)",
    )
    .bind(a.id.to_string())
    .bind(now)
    .execute(&mut *conn)
    .await;
    assert!(duplicate_all_time.is_err());
}

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;
use types::{Player, PlayerId, PlayerLookup};

use crate::{queries, DatabaseConfig, DatabaseError};

pub type Tx = Transaction<'static, Sqlite>;

/// Handle to the league database. Cheap to clone; all clones share one pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the pool described by `config` and applies pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = config.create_pool().await?;
        info!(url = %config.url, pool_size = config.pool_size, "database opened");
        let db = Self::new(pool);
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::connect(&DatabaseConfig::in_memory()).await
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Tx, DatabaseError> {
        self.pool.begin().await.map_err(DatabaseError::Transaction)
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, DatabaseError> {
        self.pool.acquire().await.map_err(DatabaseError::Connection)
    }
}

#[async_trait]
impl PlayerLookup for Database {
    type Error = DatabaseError;

    async fn exists(&self, player_id: PlayerId) -> Result<bool, DatabaseError> {
        let mut conn = self.acquire().await?;
        queries::players::player_exists(&mut conn, player_id).await
    }

    async fn get(&self, player_id: PlayerId) -> Result<Option<Player>, DatabaseError> {
        let mut conn = self.acquire().await?;
        queries::players::get_player(&mut conn, player_id).await
    }
}

pub async fn commit(tx: Tx) -> Result<(), DatabaseError> {
    tx.commit().await.map_err(DatabaseError::Transaction)
}

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub email: String,
    pub handle: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Read access to registered players, used to validate match participants.
#[async_trait]
pub trait PlayerLookup: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn exists(&self, player_id: PlayerId) -> Result<bool, Self::Error>;
    async fn get(&self, player_id: PlayerId) -> Result<Option<Player>, Self::Error>;
}

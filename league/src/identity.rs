//! Registration, login and token handling around the player table.

use std::sync::{Arc, OnceLock};

use database::queries::{players, tokens};
use database::{commit, Database, NewPlayer, Tx};
use regex::Regex;
use serde::Serialize;
use types::{Clock, Player, PlayerId};

use crate::auth::{hash_token, PasswordHasher, TokenKind, TokenService};
use crate::LeagueError;

const MIN_PASSWORD_LEN: usize = 8;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct IdentityService {
    db: Database,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    pub fn new(
        db: Database,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            hasher,
            tokens,
            clock,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        handle: &str,
        display_name: &str,
        password: &str,
    ) -> Result<Player, LeagueError> {
        let email = email.trim().to_lowercase();
        let handle = handle.trim();
        let display_name = display_name.trim();
        if !email_pattern().is_match(&email) {
            return Err(LeagueError::InvalidArgument(format!("'{email}' is not an email address")));
        }
        if handle.is_empty() || handle.contains(char::is_whitespace) {
            return Err(LeagueError::InvalidArgument(
                "handle must be a single non-empty word".to_string(),
            ));
        }
        if display_name.is_empty() {
            return Err(LeagueError::InvalidArgument("display name is required".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LeagueError::InvalidArgument(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = self.hasher.hash(password)?;
        let mut conn = self.db.acquire().await?;
        let player = players::insert_player(
            &mut conn,
            &NewPlayer {
                id: PlayerId::new(),
                email: &email,
                handle,
                display_name,
                password_hash: Some(&password_hash),
                created_at: self.clock.now(),
            },
        )
        .await
        .map_err(|e| match LeagueError::from(e) {
            LeagueError::Conflict(_) => {
                LeagueError::Conflict("email or handle is already registered".to_string())
            }
            other => other,
        })?;

        log::info!("registered player {} ({})", player.handle, player.id);
        Ok(player)
    }

    /// Checks an email and password. Unknown emails and wrong passwords fail
    /// the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Player, LeagueError> {
        let mut conn = self.db.acquire().await?;
        let email = email.trim().to_lowercase();
        let Some(player) = players::get_player_by_email(&mut conn, &email).await? else {
            log::debug!("login for unknown email");
            return Err(LeagueError::Credentials);
        };
        let Some(hash) = player.password_hash.as_deref() else {
            return Err(LeagueError::Credentials);
        };
        if !self.hasher.verify(password, hash)? {
            log::debug!("wrong password for {}", player.id);
            return Err(LeagueError::Credentials);
        }
        Ok(player)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, LeagueError> {
        let player = self.authenticate(email, password).await?;
        let mut tx = self.db.begin().await?;
        let pair = self.issue_pair(&mut tx, player.id).await?;
        commit(tx).await?;
        log::info!("{} logged in", player.handle);
        Ok(pair)
    }

    /// Trades a refresh token for a new pair. The old refresh token is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, LeagueError> {
        let now = self.clock.now();
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh, now)?;
        let player_id = claims.player_id()?;
        let token_hash = hash_token(refresh_token);

        let mut tx = self.db.begin().await?;
        let stored = tokens::find_refresh_token(&mut tx, &token_hash)
            .await?
            .filter(|record| record.is_usable(now) && record.player_id == claims.sub)
            .ok_or(LeagueError::Credentials)?;
        if !tokens::revoke_refresh_token(&mut tx, &stored.token_hash, now).await? {
            return Err(LeagueError::Credentials);
        }
        let pair = self.issue_pair(&mut tx, player_id).await?;
        commit(tx).await?;
        log::debug!("rotated refresh token for {player_id}");
        Ok(pair)
    }

    /// Revokes a refresh token. Unknown or already revoked tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), LeagueError> {
        let mut conn = self.db.acquire().await?;
        let token_hash = hash_token(refresh_token);
        if tokens::revoke_refresh_token(&mut conn, &token_hash, self.clock.now()).await? {
            log::info!("refresh token revoked");
        }
        Ok(())
    }

    /// The player an access token was issued to.
    pub async fn resolve(&self, access_token: &str) -> Result<Player, LeagueError> {
        let player_id = self.tokens.verify(access_token, TokenKind::Access, self.clock.now())?
            .player_id()?;
        let mut conn = self.db.acquire().await?;
        players::get_player(&mut conn, player_id)
            .await?
            .ok_or(LeagueError::Credentials)
    }

    pub async fn get(&self, player_id: PlayerId) -> Result<Player, LeagueError> {
        let mut conn = self.db.acquire().await?;
        players::get_player(&mut conn, player_id)
            .await?
            .ok_or_else(|| LeagueError::NotFound(format!("player {player_id}")))
    }

    pub async fn get_by_handle(&self, handle: &str) -> Result<Player, LeagueError> {
        let mut conn = self.db.acquire().await?;
        players::get_player_by_handle(&mut conn, handle.trim())
            .await?
            .ok_or_else(|| LeagueError::NotFound(format!("player '{handle}'")))
    }

    async fn issue_pair(&self, tx: &mut Tx, player_id: PlayerId) -> Result<TokenPair, LeagueError> {
        let now = self.clock.now();
        let access = self.tokens.issue(player_id, TokenKind::Access, now)?;
        let refresh = self.tokens.issue(player_id, TokenKind::Refresh, now)?;
        let refresh_hash = hash_token(&refresh.token);
        tokens::store_refresh_token(tx, player_id, &refresh_hash, now, refresh.expires_at).await?;
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "bearer",
            expires_in: (access.expires_at - now).num_seconds(),
        })
    }
}

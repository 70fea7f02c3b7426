use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::PlayerId;

use crate::LeagueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Player id.
    pub sub: String,
    pub jti: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn player_id(&self) -> Result<PlayerId, LeagueError> {
        self.sub.parse().map_err(|_| LeagueError::Credentials)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub trait TokenService: Send + Sync {
    fn issue(
        &self,
        player: PlayerId,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, LeagueError>;

    /// Checks signature, kind, and expiry as of `now`. Any failure is
    /// [`LeagueError::Credentials`].
    fn verify(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, LeagueError>;
}

/// HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        player: PlayerId,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, LeagueError> {
        let expires_at = now + self.ttl(kind);
        let claims = Claims {
            sub: player.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            kind,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| LeagueError::Internal(format!("token signing failed: {e}")))?;
        Ok(IssuedToken {
            token,
            // whole seconds, as carried in the token
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    fn verify(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, LeagueError> {
        // expiry is checked against the caller's clock below
        let mut validation = Validation::default();
        validation.validate_exp = false;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                log::debug!("token rejected: {e}");
                LeagueError::Credentials
            })?;
        if data.claims.kind != kind || data.claims.exp <= now.timestamp() {
            return Err(LeagueError::Credentials);
        }
        Ok(data.claims)
    }
}

/// Tokens are stored hashed, never raw.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtTokenService {
        JwtTokenService::new(b"test-secret", Duration::minutes(15), Duration::days(7))
    }

    #[test]
    fn issued_access_token_verifies() {
        let tokens = service();
        let player = PlayerId::new();
        let issued = tokens.issue(player, TokenKind::Access, Utc::now()).unwrap();

        let claims = tokens.verify(&issued.token, TokenKind::Access, Utc::now()).unwrap();
        assert_eq!(claims.player_id().unwrap(), player);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn kind_must_match() {
        let tokens = service();
        let issued = tokens
            .issue(PlayerId::new(), TokenKind::Refresh, Utc::now())
            .unwrap();
        assert!(matches!(
            tokens.verify(&issued.token, TokenKind::Access, Utc::now()),
            Err(LeagueError::Credentials)
        ));
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let tokens = service();
        let now = Utc::now();
        let issued = tokens.issue(PlayerId::new(), TokenKind::Access, now).unwrap();
        assert!(tokens.verify(&issued.token, TokenKind::Access, now).is_ok());
        let later = now + Duration::minutes(16);
        assert!(tokens.verify(&issued.token, TokenKind::Access, later).is_err());

        let other = JwtTokenService::new(b"other-secret", Duration::minutes(15), Duration::days(7));
        let foreign = other
            .issue(PlayerId::new(), TokenKind::Access, Utc::now())
            .unwrap();
        assert!(tokens.verify(&foreign.token, TokenKind::Access, now).is_err());
        assert!(tokens.verify("garbage", TokenKind::Access, now).is_err());
    }

    #[test]
    fn token_hash_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}

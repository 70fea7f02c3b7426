use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::LeagueError;

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, LeagueError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, LeagueError>;
}

/// argon2id with a random salt per hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, LeagueError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LeagueError::Internal(format!("password hashing failed: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, LeagueError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| LeagueError::Internal(format!("stored hash is unreadable: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("cue-ball-1").unwrap();
        assert!(hasher.verify("cue-ball-1", &hash).unwrap());
        assert!(!hasher.verify("cue-ball-2", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = Argon2Hasher;
        assert_ne!(hasher.hash("rack-em").unwrap(), hasher.hash("rack-em").unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(Argon2Hasher.verify("x", "not-a-phc-string").is_err());
    }
}

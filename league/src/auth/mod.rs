//! Credential hashing and token issuance.
//!
//! Both are capabilities the identity service is handed; the argon2 and JWT
//! implementations here are the defaults.

pub mod password;
pub mod tokens;

pub use password::{Argon2Hasher, PasswordHasher};
pub use tokens::{hash_token, Claims, IssuedToken, JwtTokenService, TokenKind, TokenService};

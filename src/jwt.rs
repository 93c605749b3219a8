//! Access-credential minting and verification.
//!
//! Access credentials are short-lived HS256 tokens carrying the account id
//! and role. Refresh tokens are opaque random strings tracked in the
//! `sessions` table (see `db::session`) and never pass through here.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::Role;

/// Default access-token duration: 15 minutes.
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;

/// Default refresh-session duration: 2 weeks.
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// Claims embedded in a signed access credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (account id)
    pub sub: i64,
    /// Account role
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of minting an access credential.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The signed token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Configuration for access-credential operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: u64,
}

impl JwtConfig {
    /// Create a new configuration with the given signing secret and TTL.
    pub fn new(secret: &[u8], access_ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs,
        }
    }

    /// Mint an access credential for an account.
    pub fn mint_access(&self, account_id: i64, role: Role) -> Result<AccessToken, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::TimeError)?
            .as_secs();

        let claims = AccessClaims {
            sub: account_id,
            role,
            iat: now,
            exp: now + self.access_ttl_secs,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(AccessToken {
            token,
            duration: self.access_ttl_secs,
        })
    }

    /// Verify an access credential and return its claims.
    ///
    /// Every failure mode (bad signature, tampered payload, expired,
    /// malformed) collapses into the single `InvalidCredential` value so
    /// callers cannot probe why verification failed.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, InvalidCredential> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| InvalidCredential)
    }
}

/// Opaque verification failure. Carries no cause on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCredential;

impl std::fmt::Display for InvalidCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid credential")
    }
}

impl std::error::Error for InvalidCredential {}

/// Errors that can occur while minting a credential.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}

//! Opaque refresh tokens.
//!
//! The raw token is handed to the client once; only its SHA-256 digest is
//! persisted, so lookups are a single indexed equality match.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Random bytes per token (64 base64url characters).
pub const REFRESH_TOKEN_BYTES: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedRefreshToken {
    /// Returned to the client, never stored.
    pub raw: String,
    /// Hex SHA-256 of `raw`, stored.
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedRefreshToken {
    pub fn generate(now: DateTime<Utc>, ttl: Duration) -> Self {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let raw = URL_SAFE_NO_PAD.encode(bytes);
        let digest = digest(&raw);
        Self {
            raw,
            digest,
            expires_at: now + ttl,
        }
    }
}

/// Digest under which a raw token is stored.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenError {
    #[error("Expired or revoked refresh token")]
    ExpiredOrRevoked,
}

/// A stored token may be exchanged only while unexpired and not revoked.
pub fn ensure_usable(
    expires_at: DateTime<Utc>,
    revoked: bool,
    now: DateTime<Utc>,
) -> Result<(), RefreshTokenError> {
    if revoked || expires_at < now {
        return Err(RefreshTokenError::ExpiredOrRevoked);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_url_safe() {
        let now = Utc::now();
        let a = IssuedRefreshToken::generate(now, Duration::days(30));
        let b = IssuedRefreshToken::generate(now, Duration::days(30));

        assert_ne!(a.raw, b.raw);
        assert_eq!(a.raw.len(), 64);
        assert!(a.raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(a.expires_at, now + Duration::days(30));
    }

    #[test]
    fn digest_is_stable_and_does_not_leak_raw() {
        let token = IssuedRefreshToken::generate(Utc::now(), Duration::days(1));
        assert_eq!(token.digest, digest(&token.raw));
        assert_eq!(token.digest.len(), 64);
        assert_ne!(token.digest, token.raw);
    }

    #[test]
    fn expired_or_revoked_tokens_are_unusable() {
        let now = Utc::now();
        assert!(ensure_usable(now + Duration::hours(1), false, now).is_ok());
        assert_eq!(
            ensure_usable(now - Duration::seconds(1), false, now),
            Err(RefreshTokenError::ExpiredOrRevoked)
        );
        assert_eq!(
            ensure_usable(now + Duration::hours(1), true, now),
            Err(RefreshTokenError::ExpiredOrRevoked)
        );
    }
}

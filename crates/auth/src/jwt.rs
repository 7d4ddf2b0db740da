//! HMAC-signed JWT access tokens.

use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use schelper_core::UserId;

use crate::claims::{validate_claims, AccessClaims, TokenError};
use crate::Role;

/// Supported signing algorithms (shared-secret HMAC only).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum JwtAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl JwtAlgorithm {
    fn as_jsonwebtoken(self) -> Algorithm {
        match self {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::Hs384 => Algorithm::HS384,
            JwtAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(JwtAlgorithm::Hs256),
            "HS384" => Ok(JwtAlgorithm::Hs384),
            "HS512" => Ok(JwtAlgorithm::Hs512),
            other => Err(format!("unsupported JWT algorithm '{other}' (expected HS256, HS384 or HS512)")),
        }
    }
}

/// Mints access tokens.
pub trait JwtIssuer: Send + Sync {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// Verifies access tokens and returns their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError>;
}

/// Shared-secret JWT codec.
pub struct HmacJwt {
    algorithm: JwtAlgorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl HmacJwt {
    pub fn new(secret: &[u8], algorithm: JwtAlgorithm, ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl core::fmt::Debug for HmacJwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HmacJwt")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtIssuer for HmacJwt {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = AccessClaims::new(user_id, role, now, now + self.ttl);
        jsonwebtoken::encode(&Header::new(self.algorithm.as_jsonwebtoken()), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl JwtValidator for HmacJwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        // Time checks are done against the caller's clock in `validate_claims`.
        let mut validation = Validation::new(self.algorithm.as_jsonwebtoken());
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> HmacJwt {
        HmacJwt::new(secret.as_bytes(), JwtAlgorithm::Hs256, Duration::minutes(30))
    }

    #[test]
    fn issued_token_validates_with_same_secret() {
        let jwt = codec("s3cret");
        let now = Utc::now();
        let token = jwt.issue(UserId::new(11), Role::Parent, now).unwrap();

        let claims = jwt.validate(&token, now).unwrap();
        assert_eq!(claims.sub, "11");
        assert_eq!(claims.role, Role::Parent);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let now = Utc::now();
        let token = codec("one").issue(UserId::new(1), Role::Admin, now).unwrap();
        assert!(matches!(codec("two").validate(&token, now), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn token_expires_after_ttl() {
        let jwt = codec("s3cret");
        let now = Utc::now();
        let token = jwt.issue(UserId::new(1), Role::Child, now).unwrap();
        assert_eq!(
            jwt.validate(&token, now + Duration::minutes(31)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let now = Utc::now();
        let hs512 = HmacJwt::new(b"k", JwtAlgorithm::Hs512, Duration::minutes(1));
        let token = hs512.issue(UserId::new(1), Role::Child, now).unwrap();
        assert!(codec("k").validate(&token, now).is_err());
    }

    #[test]
    fn parses_algorithm_names() {
        assert_eq!("hs384".parse::<JwtAlgorithm>(), Ok(JwtAlgorithm::Hs384));
        assert!("RS256".parse::<JwtAlgorithm>().is_err());
    }
}

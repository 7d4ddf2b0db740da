//! Process configuration, read from the environment once at startup.
//!
//! An optional `.env` file in the working directory is loaded first; real
//! environment variables win over it.

use chrono::Duration;
use thiserror::Error;

use schelper_auth::JwtAlgorithm;
use schelper_infra::{DatabaseUrl, DatabaseUrlError};

/// Port the server listens on (and the container exposes).
pub const DEFAULT_PORT: u16 = 8001;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";
const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 30;
const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL: {0}")]
    DatabaseUrl(#[from] DatabaseUrlError),

    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    /// `None` selects the in-memory store.
    pub database_url: Option<DatabaseUrl>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_algorithm: JwtAlgorithm,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: Option<u32>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL")
            .map(|raw| DatabaseUrl::parse(&raw))
            .transpose()?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());

        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(raw) => raw
                .parse::<JwtAlgorithm>()
                .map_err(|e| ConfigError::invalid("JWT_ALGORITHM", e))?,
            None => JwtAlgorithm::default(),
        };

        let access_minutes = parse_positive(
            "ACCESS_TOKEN_EXPIRES_MINUTES",
            get("ACCESS_TOKEN_EXPIRES_MINUTES"),
            DEFAULT_ACCESS_TOKEN_MINUTES,
        )?;
        let refresh_days = parse_positive(
            "REFRESH_TOKEN_EXPIRES_DAYS",
            get("REFRESH_TOKEN_EXPIRES_DAYS"),
            DEFAULT_REFRESH_TOKEN_DAYS,
        )?;
        let db_max_connections = parse_positive(
            "DB_MAX_CONNECTIONS",
            get("DB_MAX_CONNECTIONS"),
            i64::from(DEFAULT_DB_MAX_CONNECTIONS),
        )?;

        let bcrypt_cost = get("BCRYPT_COST")
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|e| ConfigError::invalid("BCRYPT_COST", e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            database_url,
            db_max_connections: u32::try_from(db_max_connections)
                .map_err(|e| ConfigError::invalid("DB_MAX_CONNECTIONS", e.to_string()))?,
            jwt_secret,
            jwt_algorithm,
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),
            bcrypt_cost,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt_secret", &"***")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

fn parse_positive(key: &'static str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        Ok(value) => Err(ConfigError::invalid(key, format!("must be positive, got {value}"))),
        Err(e) => Err(ConfigError::invalid(key, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert!(s.database_url.is_none());
        assert!(s.uses_default_secret());
        assert_eq!(s.jwt_algorithm, JwtAlgorithm::Hs256);
        assert_eq!(s.access_token_ttl, Duration::minutes(30));
        assert_eq!(s.refresh_token_ttl, Duration::days(30));
        assert_eq!(s.db_max_connections, 10);
        assert_eq!(s.bcrypt_cost, None);
    }

    #[test]
    fn reads_overrides() {
        let s = settings(&[
            ("DATABASE_URL", "postgresql+asyncpg://app:pw@db:5432/app"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_EXPIRES_MINUTES", "5"),
            ("REFRESH_TOKEN_EXPIRES_DAYS", "7"),
            ("BCRYPT_COST", "4"),
        ])
        .unwrap();
        assert_eq!(
            s.database_url.as_ref().map(DatabaseUrl::as_str),
            Some("postgres://app:pw@db:5432/app")
        );
        assert!(!s.uses_default_secret());
        assert_eq!(s.jwt_algorithm, JwtAlgorithm::Hs512);
        assert_eq!(s.access_token_ttl, Duration::minutes(5));
        assert_eq!(s.refresh_token_ttl, Duration::days(7));
        assert_eq!(s.bcrypt_cost, Some(4));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let s = settings(&[("DATABASE_URL", "  "), ("JWT_SECRET", "")]).unwrap();
        assert!(s.database_url.is_none());
        assert!(s.uses_default_secret());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            settings(&[("DATABASE_URL", "sqlite:///dev.db")]),
            Err(ConfigError::DatabaseUrl(_))
        ));
        assert!(matches!(
            settings(&[("JWT_ALGORITHM", "RS256")]),
            Err(ConfigError::Invalid { key: "JWT_ALGORITHM", .. })
        ));
        assert!(matches!(
            settings(&[("ACCESS_TOKEN_EXPIRES_MINUTES", "0")]),
            Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRES_MINUTES", .. })
        ));
        assert!(matches!(
            settings(&[("BCRYPT_COST", "twelve")]),
            Err(ConfigError::Invalid { key: "BCRYPT_COST", .. })
        ));
    }

    #[test]
    fn debug_hides_the_secret() {
        let s = settings(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert!(!format!("{s:?}").contains("s3cret"));
    }
}

//! Shared application services (store, token codec, password hasher).
//!
//! Built once by `main` (or a test) and handed to every handler as an
//! `Extension<Arc<AppServices>>`.

use std::sync::Arc;

use chrono::{Duration, Utc};

use schelper_auth::{HmacJwt, IssuedRefreshToken, JwtIssuer, PasswordHasher};
use schelper_core::Password;
use schelper_infra::{Database, InMemoryStore, NewRefreshToken, PostgresStore, UserRecord};

use crate::app::errors::ApiError;
use crate::config::Settings;

pub struct AppServices {
    pub db: Arc<dyn Database>,
    pub jwt: Arc<HmacJwt>,
    pub hasher: PasswordHasher,
    pub refresh_ttl: Duration,
}

impl AppServices {
    pub fn new(
        db: Arc<dyn Database>,
        jwt: HmacJwt,
        hasher: PasswordHasher,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            db,
            jwt: Arc::new(jwt),
            hasher,
            refresh_ttl,
        }
    }

    /// Postgres when `DATABASE_URL` is set, otherwise a process-local in-memory store.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let db: Arc<dyn Database> = match &settings.database_url {
            Some(url) => Arc::new(PostgresStore::connect_lazy(
                url.clone(),
                settings.db_max_connections,
            )?),
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
                Arc::new(InMemoryStore::new())
            }
        };

        let hasher = match settings.bcrypt_cost {
            Some(cost) => PasswordHasher::new(cost)?,
            None => PasswordHasher::default(),
        };

        let jwt = HmacJwt::new(
            settings.jwt_secret.as_bytes(),
            settings.jwt_algorithm,
            settings.access_token_ttl,
        );

        Ok(Self::new(db, jwt, hasher, settings.refresh_token_ttl))
    }

    /// bcrypt on a blocking thread.
    pub async fn hash_password(&self, password: Password) -> Result<String, ApiError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    pub async fn verify_password(&self, plain: String, hash: String) -> bool {
        let hasher = self.hasher;
        match tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(error = %e, "password verification task failed");
                false
            }
        }
    }

    pub fn access_token_for(&self, user: &UserRecord) -> Result<String, ApiError> {
        self.jwt
            .issue(user.id, user.role, Utc::now())
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    /// Mint a refresh token for `user`, persist its digest, and return the raw value.
    pub async fn issue_refresh_token(&self, user: &UserRecord) -> Result<String, ApiError> {
        let issued = IssuedRefreshToken::generate(Utc::now(), self.refresh_ttl);
        self.db
            .insert_refresh_token(NewRefreshToken {
                user_id: user.id,
                token_hash: issued.digest,
                expires_at: issued.expires_at,
            })
            .await?;
        Ok(issued.raw)
    }
}

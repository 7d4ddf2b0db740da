use async_trait::async_trait;
use thiserror::Error;

use schelper_core::{Email, UserId};

use super::model::{
    LinkRecord, NewLink, NewRefreshToken, NewUser, RefreshTokenRecord, UserChanges, UserRecord,
};
use crate::db::DbState;

/// Store-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// A stored value could not be mapped back into a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The database could not be reached (pool closed, timeout, IO).
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    async fn user_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError>;

    /// All users, ordered by id.
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Returns `None` when the user does not exist; `Conflict` on an email collision.
    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Removes the user with its links and refresh tokens. Returns whether a row was removed.
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Idempotent: an existing `(parent, child)` pair is returned unchanged.
    async fn link_parent_child(&self, link: NewLink) -> Result<LinkRecord, StoreError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, StoreError>;

    async fn refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;
}

/// Schema lifecycle: bootstrap at startup, inspection for health checks, release at shutdown.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Create missing tables, then report which expected tables exist.
    async fn init_schema(&self) -> Result<DbState, StoreError>;

    async fn inspect(&self) -> Result<DbState, StoreError>;

    /// Release connections. Infallible; safe to call more than once.
    async fn close(&self);

    /// Redacted location, safe to log.
    fn describe(&self) -> String;
}

/// Everything the HTTP layer needs from persistence.
pub trait Database: UserStore + LinkStore + RefreshTokenStore + SchemaStore {}

impl<T> Database for T where T: UserStore + LinkStore + RefreshTokenStore + SchemaStore {}

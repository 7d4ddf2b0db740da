//! Infrastructure layer: database connection, schema bootstrap and stores.

pub mod db;
pub mod store;

pub use db::{DatabaseUrl, DatabaseUrlError, DbState, EXPECTED_TABLES};
pub use store::{
    Database, InMemoryStore, LinkRecord, LinkStore, NewLink, NewRefreshToken, NewUser, PostgresStore,
    RefreshTokenRecord, RefreshTokenStore, SchemaStore, StoreError, UserChanges, UserRecord,
    UserStore,
};

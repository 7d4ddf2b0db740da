//! User, link and refresh-token persistence.
//!
//! - `trait.rs`: store contracts and the error model
//! - `model.rs`: records exchanged with the stores
//! - `postgres.rs`: sqlx/Postgres implementation (production)
//! - `in_memory.rs`: lock-guarded maps (dev/test)

pub mod in_memory;
pub mod model;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use model::{LinkRecord, NewLink, NewRefreshToken, NewUser, RefreshTokenRecord, UserChanges, UserRecord};
pub use postgres::PostgresStore;
pub use r#trait::{Database, LinkStore, RefreshTokenStore, SchemaStore, StoreError, UserStore};

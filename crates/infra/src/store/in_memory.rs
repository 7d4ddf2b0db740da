//! In-memory store for tests/dev.
//!
//! Mirrors the Postgres constraints that callers rely on: unique emails,
//! unique `(parent, child)` links, cascading deletes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use schelper_core::{Email, Entity, LinkId, UserId};

use super::model::{
    LinkRecord, NewLink, NewRefreshToken, NewUser, RefreshTokenRecord, UserChanges, UserRecord,
};
use super::r#trait::{LinkStore, RefreshTokenStore, SchemaStore, StoreError, UserStore};
use crate::db::{DbState, EXPECTED_TABLES};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, UserRecord>,
    links: Vec<LinkRecord>,
    refresh_tokens: Vec<RefreshTokenRecord>,
    next_user_id: i64,
    next_link_id: i64,
    next_token_id: i64,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut state = self.state.write().await;
        if state.email_taken(user.email.as_str(), None) {
            return Err(StoreError::Conflict("email already registered".into()));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: UserId::new(state.next_user_id),
            name: user.name,
            email: user.email.into(),
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email.as_str()).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut state = self.state.write().await;
        if let Some(email) = &changes.email {
            if state.email_taken(email.as_str(), Some(id)) {
                return Err(StoreError::Conflict("email already registered".into()));
            }
        }

        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email.into();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.links.retain(|l| l.parent_id != id && l.child_id != id);
        state.refresh_tokens.retain(|t| t.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl LinkStore for InMemoryStore {
    async fn link_parent_child(&self, link: NewLink) -> Result<LinkRecord, StoreError> {
        let mut state = self.state.write().await;
        for id in [link.parent_id, link.child_id] {
            if !state.users.contains_key(&id) {
                return Err(StoreError::MissingReference(format!("{} {id}", UserRecord::KIND)));
            }
        }

        if let Some(existing) = state
            .links
            .iter()
            .find(|l| l.parent_id == link.parent_id && l.child_id == link.child_id)
        {
            return Ok(existing.clone());
        }

        state.next_link_id += 1;
        let record = LinkRecord {
            id: LinkId::new(state.next_link_id),
            parent_id: link.parent_id,
            child_id: link.child_id,
            relation_type: link.relation_type,
        };
        state.links.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn insert_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&token.user_id) {
            return Err(StoreError::MissingReference(format!(
                "{} {}",
                UserRecord::KIND,
                token.user_id
            )));
        }

        state.next_token_id += 1;
        let record = RefreshTokenRecord {
            id: state.next_token_id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            created_at: Utc::now(),
            expires_at: token.expires_at,
            revoked: false,
        };
        state.refresh_tokens.push(record.clone());
        Ok(record)
    }

    async fn refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }
}

#[async_trait]
impl SchemaStore for InMemoryStore {
    async fn init_schema(&self) -> Result<DbState, StoreError> {
        self.inspect().await
    }

    async fn inspect(&self) -> Result<DbState, StoreError> {
        Ok(DbState {
            database_url: self.describe(),
            tables: EXPECTED_TABLES.iter().map(|t| (t.to_string(), true)).collect(),
        })
    }

    async fn close(&self) {}

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

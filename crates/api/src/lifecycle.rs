//! Startup/shutdown scope around the HTTP server.
//!
//! `Lifecycle::run` awaits `Lifespan::startup` before the serve future is
//! first polled, runs the server on its own task, and then calls
//! `Lifespan::shutdown` exactly once however serving ended (clean exit,
//! error, or panic). A failed startup never serves.
//!
//! States move strictly forward:
//! `NotStarted -> Initializing -> Serving -> ShuttingDown -> Stopped`,
//! with `Initializing -> Stopped` on startup failure.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use schelper_infra::Database;
use schelper_observability::LogControl;

/// Target of the per-statement sqlx log lines, silenced at startup.
pub const NOISY_QUERY_TARGET: &str = "sqlx::query";

#[async_trait]
pub trait Lifespan: Send + Sync {
    /// Must succeed before any request is served.
    async fn startup(&self) -> anyhow::Result<()>;

    /// Infallible cleanup.
    async fn shutdown(&self);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Initializing,
    Serving,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("startup failed: {0}")]
    Startup(String),

    #[error("server failed: {0}")]
    Serve(String),

    #[error("server task panicked: {0}")]
    Panicked(String),
}

pub struct Lifecycle<L> {
    lifespan: L,
    state: watch::Sender<LifecycleState>,
}

impl<L: Lifespan> Lifecycle<L> {
    pub fn new(lifespan: L) -> Self {
        let (state, _) = watch::channel(LifecycleState::NotStarted);
        Self { lifespan, state }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Run `serve` inside the startup/shutdown scope. Consumes the lifecycle.
    pub async fn run<F>(self, serve: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.transition(LifecycleState::Initializing);
        if let Err(e) = self.lifespan.startup().await {
            tracing::error!(error = %format!("{e:#}"), "startup failed; not serving");
            self.transition(LifecycleState::Stopped);
            return Err(LifecycleError::Startup(format!("{e:#}")));
        }

        self.transition(LifecycleState::Serving);
        let outcome = match tokio::spawn(serve).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LifecycleError::Serve(format!("{e:#}"))),
            Err(join) => Err(LifecycleError::Panicked(join.to_string())),
        };
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "serving ended abnormally");
        }

        self.transition(LifecycleState::ShuttingDown);
        self.lifespan.shutdown().await;
        self.transition(LifecycleState::Stopped);
        outcome
    }

    fn transition(&self, next: LifecycleState) {
        let prev = self.state.send_replace(next);
        tracing::debug!(from = ?prev, to = ?next, "lifecycle transition");
    }
}

/// The server's lifespan: schema bootstrap on startup, pool release on shutdown.
pub struct AppLifespan {
    db: Arc<dyn Database>,
    logs: LogControl,
}

impl AppLifespan {
    pub fn new(db: Arc<dyn Database>, logs: LogControl) -> Self {
        Self { db, logs }
    }
}

#[async_trait]
impl Lifespan for AppLifespan {
    async fn startup(&self) -> anyhow::Result<()> {
        if let Err(e) = self.logs.silence(NOISY_QUERY_TARGET) {
            tracing::warn!(error = %e, target = NOISY_QUERY_TARGET, "could not silence log target");
        }

        tracing::info!(database_url = %self.db.describe(), "initializing database");
        let state = self.db.init_schema().await?;
        tracing::info!(tables = ?state.tables, "database ready");

        let missing: Vec<_> = state
            .tables
            .iter()
            .filter(|(_, present)| !**present)
            .map(|(name, _)| name.as_str())
            .collect();
        if !missing.is_empty() {
            anyhow::bail!("tables missing after schema init: {}", missing.join(", "));
        }
        Ok(())
    }

    async fn shutdown(&self) {
        tracing::info!("shutting down; closing database connections");
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use schelper_core::{Email, UserId};
    use schelper_infra::{
        DbState, InMemoryStore, LinkRecord, LinkStore, NewLink, NewRefreshToken, NewUser,
        RefreshTokenRecord, RefreshTokenStore, SchemaStore, StoreError, UserChanges, UserRecord,
        UserStore,
    };

    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<&'static str>>,
    }

    impl Recorder {
        fn push(&self, event: &'static str) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    struct MockLifespan {
        recorder: Arc<Recorder>,
        fail_startup: bool,
    }

    #[async_trait]
    impl Lifespan for MockLifespan {
        async fn startup(&self) -> anyhow::Result<()> {
            self.recorder.push("startup");
            if self.fail_startup {
                anyhow::bail!("database unreachable");
            }
            Ok(())
        }

        async fn shutdown(&self) {
            self.recorder.push("shutdown");
        }
    }

    async fn failing_server() -> anyhow::Result<()> {
        anyhow::bail!("address in use")
    }

    async fn panicking_server() -> anyhow::Result<()> {
        panic!("handler bug")
    }

    fn lifecycle(fail_startup: bool) -> (Lifecycle<MockLifespan>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let lifespan = MockLifespan {
            recorder: recorder.clone(),
            fail_startup,
        };
        (Lifecycle::new(lifespan), recorder)
    }

    #[tokio::test]
    async fn startup_runs_once_before_serving_and_shutdown_once_after() {
        let (lc, recorder) = lifecycle(false);
        assert_eq!(lc.state(), LifecycleState::NotStarted);
        let states = lc.subscribe();

        let serve_recorder = recorder.clone();
        let result = lc
            .run(async move {
                assert_eq!(*states.borrow(), LifecycleState::Serving);
                serve_recorder.push("serve");
                Ok::<(), anyhow::Error>(())
            })
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(recorder.events(), ["startup", "serve", "shutdown"]);
    }

    #[tokio::test]
    async fn failed_startup_never_serves() {
        let (lc, recorder) = lifecycle(true);
        let states = lc.subscribe();

        let serve_recorder = recorder.clone();
        let result = lc
            .run(async move {
                serve_recorder.push("serve");
                Ok::<(), anyhow::Error>(())
            })
            .await;

        assert!(matches!(result, Err(LifecycleError::Startup(msg)) if msg.contains("unreachable")));
        assert_eq!(recorder.events(), ["startup"]);
        assert_eq!(*states.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn shutdown_runs_once_when_serving_fails() {
        let (lc, recorder) = lifecycle(false);
        let states = lc.subscribe();

        let result = lc.run(failing_server()).await;

        assert!(matches!(result, Err(LifecycleError::Serve(msg)) if msg.contains("address in use")));
        assert_eq!(recorder.events(), ["startup", "shutdown"]);
        assert_eq!(*states.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn shutdown_runs_once_when_serving_panics() {
        let (lc, recorder) = lifecycle(false);

        let result = lc.run(panicking_server()).await;

        assert!(matches!(result, Err(LifecycleError::Panicked(_))));
        assert_eq!(recorder.events(), ["startup", "shutdown"]);
    }

    /// Store whose schema bootstrap leaves `refresh_tokens` missing.
    #[derive(Default)]
    struct HalfMigratedStore {
        inner: InMemoryStore,
    }

    #[async_trait]
    impl UserStore for HalfMigratedStore {
        async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
            self.inner.insert_user(user).await
        }

        async fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
            self.inner.user_by_id(id).await
        }

        async fn user_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
            self.inner.user_by_email(email).await
        }

        async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
            self.inner.list_users().await
        }

        async fn update_user(
            &self,
            id: UserId,
            changes: UserChanges,
        ) -> Result<Option<UserRecord>, StoreError> {
            self.inner.update_user(id, changes).await
        }

        async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
            self.inner.delete_user(id).await
        }
    }

    #[async_trait]
    impl LinkStore for HalfMigratedStore {
        async fn link_parent_child(&self, link: NewLink) -> Result<LinkRecord, StoreError> {
            self.inner.link_parent_child(link).await
        }
    }

    #[async_trait]
    impl RefreshTokenStore for HalfMigratedStore {
        async fn insert_refresh_token(
            &self,
            token: NewRefreshToken,
        ) -> Result<RefreshTokenRecord, StoreError> {
            self.inner.insert_refresh_token(token).await
        }

        async fn refresh_token_by_hash(
            &self,
            token_hash: &str,
        ) -> Result<Option<RefreshTokenRecord>, StoreError> {
            self.inner.refresh_token_by_hash(token_hash).await
        }
    }

    #[async_trait]
    impl SchemaStore for HalfMigratedStore {
        async fn init_schema(&self) -> Result<DbState, StoreError> {
            self.inspect().await
        }

        async fn inspect(&self) -> Result<DbState, StoreError> {
            let mut state = self.inner.inspect().await?;
            state.tables.insert("refresh_tokens".to_string(), false);
            Ok(state)
        }

        async fn close(&self) {
            self.inner.close().await
        }

        fn describe(&self) -> String {
            "memory://half-migrated".to_string()
        }
    }

    #[tokio::test]
    async fn missing_table_after_bootstrap_fails_startup() {
        let db: Arc<dyn Database> = Arc::new(HalfMigratedStore::default());
        let lifecycle = Lifecycle::new(AppLifespan::new(db, LogControl::detached()));
        let states = lifecycle.subscribe();
        let served = Arc::new(Recorder::default());

        let serve_recorder = served.clone();
        let result = lifecycle
            .run(async move {
                serve_recorder.push("serve");
                Ok::<(), anyhow::Error>(())
            })
            .await;

        assert!(matches!(result, Err(LifecycleError::Startup(msg)) if msg.contains("refresh_tokens")));
        assert!(served.events().is_empty());
        assert_eq!(*states.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn app_lifespan_bootstraps_the_store() {
        let db: Arc<dyn Database> = Arc::new(InMemoryStore::new());
        let lifespan = AppLifespan::new(db, LogControl::detached());

        lifespan.startup().await.unwrap();
        lifespan.shutdown().await;
    }
}

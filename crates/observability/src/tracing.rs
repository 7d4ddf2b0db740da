//! Tracing/logging initialization.
//!
//! JSON logs with timestamps, filtered by `RUST_LOG` (default `info`). The
//! filter sits behind a reload layer so individual targets can be silenced
//! after startup.

use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::{
    filter::Directive, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER: OnceLock<FilterHandle> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LogControlError {
    #[error("invalid filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("log filter reload failed: {0}")]
    Reload(String),
}

/// Handle over the process log filter.
///
/// When another subscriber was installed first (e.g. by a test harness) the
/// handle is detached and filter changes are no-ops.
#[derive(Debug, Clone, Default)]
pub struct LogControl {
    handle: Option<FilterHandle>,
}

impl LogControl {
    /// A handle that never touches any subscriber.
    pub fn detached() -> Self {
        Self { handle: None }
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Only let `error` events from `target` through.
    pub fn silence(&self, target: &str) -> Result<(), LogControlError> {
        self.set_level(target, "error")
    }

    /// Add or replace the directive `target=level`.
    pub fn set_level(&self, target: &str, level: &str) -> Result<(), LogControlError> {
        let raw = format!("{target}={level}");
        let directive: Directive = raw.parse().map_err(|e| LogControlError::InvalidDirective {
            directive: raw.clone(),
            reason: format!("{e}"),
        })?;

        let Some(handle) = &self.handle else {
            return Ok(());
        };

        handle
            .modify(|filter| {
                let current = std::mem::replace(filter, EnvFilter::new(""));
                *filter = current.add_directive(directive);
            })
            .map_err(|e| LogControlError::Reload(e.to_string()))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls return the same handle).
pub fn init() -> LogControl {
    if let Some(handle) = FILTER.get() {
        return LogControl {
            handle: Some(handle.clone()),
        };
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_timer(tracing_subscriber::fmt::time::SystemTime)
                .with_target(true),
        )
        .try_init();

    if installed.is_err() {
        return LogControl::detached();
    }

    let handle = FILTER.get_or_init(|| handle).clone();
    LogControl { handle: Some(handle) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_control_accepts_valid_directives() {
        let control = LogControl::detached();
        assert!(!control.is_attached());
        assert!(control.silence("sqlx::query").is_ok());
    }

    #[test]
    fn invalid_level_is_reported() {
        let err = LogControl::detached()
            .set_level("sqlx::query", "loudest")
            .unwrap_err();
        assert!(matches!(err, LogControlError::InvalidDirective { .. }));
    }

    #[test]
    fn init_is_idempotent() {
        let first = init();
        let second = init();
        assert_eq!(first.is_attached(), second.is_attached());
        assert!(second.silence("hyper").is_ok());
    }
}

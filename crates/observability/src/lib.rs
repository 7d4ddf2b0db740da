//! Tracing and logging setup shared by the server binary and tests.

/// Initialize process-wide logging.
///
/// Safe to call multiple times; only the first call installs a subscriber.
/// The returned handle can adjust filtering at runtime.
pub fn init() -> LogControl {
    tracing::init()
}

/// Subscriber construction and runtime filter control.
pub mod tracing;

pub use self::tracing::{LogControl, LogControlError};

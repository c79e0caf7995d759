//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration rejected at construction time.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Bounded work queue has no room for another item.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// No async runtime available to dispatch tasks on.
    #[error("runtime unavailable: {0}")]
    Runtime(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

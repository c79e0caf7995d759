//! Tokio runtime spawner implementation.

use std::future::Future;

use tokio::runtime::Handle;

use crate::core::{SchedulerError, Spawn};

/// Spawner that runs dispatched tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Spawner for the runtime the caller is running on.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| SchedulerError::Runtime(e.to_string()))
    }

    /// Underlying runtime handle.
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Detached: completion is reported through the task's signal.
        drop(self.handle.spawn(fut));
    }
}

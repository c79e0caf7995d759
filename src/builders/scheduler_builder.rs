//! Builders to construct schedulers from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{SchedulerConfig, ThrottleConfig};
use crate::core::{
    DiagnosticSink, Scheduler, SchedulerError, Spawn, WorkQueue, DEFAULT_LIMIT,
};
use crate::infra::queue::memory::InMemoryQueue;

/// Fluent builder over [`SchedulerConfig`].
#[derive(Clone)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl SchedulerBuilder {
    /// Start from an existing configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config, sink: None }
    }

    /// Start from defaults with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(SchedulerConfig {
            name: name.into(),
            ..SchedulerConfig::default()
        })
    }

    /// Limit applied when none is configured.
    pub const fn default_limit() -> usize {
        DEFAULT_LIMIT
    }

    /// Scheduler name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration as built so far.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Set the concurrency limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Bound the queue; `None` leaves it unbounded.
    #[must_use]
    pub fn max_queue_depth(mut self, depth: Option<usize>) -> Self {
        self.config.max_queue_depth = depth;
        self
    }

    /// Enable per-task diagnostic events.
    #[must_use]
    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.config.diagnostics = enabled;
        self
    }

    /// Start the scheduler as part of `build`.
    #[must_use]
    pub fn autostart(mut self, autostart: bool) -> Self {
        self.config.autostart = autostart;
        self
    }

    /// Attach a diagnostic sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build with an in-memory queue sized by `max_queue_depth`.
    pub fn build<S>(self, spawner: S) -> Result<Scheduler<S>, SchedulerError>
    where
        S: Spawn + Send + Sync + 'static,
    {
        let queue = self
            .config
            .max_queue_depth
            .map_or_else(InMemoryQueue::new, InMemoryQueue::bounded);
        self.build_with_queue(queue, spawner)
    }

    /// Build with a caller-supplied queue backend.
    ///
    /// The queue's own bound is authoritative. A configured
    /// `max_queue_depth` that differs from `queue.max_depth()` is rejected
    /// with [`SchedulerError::InvalidConfig`].
    pub fn build_with_queue<S, Q>(self, queue: Q, spawner: S) -> Result<Scheduler<S, Q>, SchedulerError>
    where
        S: Spawn + Send + Sync + 'static,
        Q: WorkQueue + 'static,
    {
        let scheduler = Scheduler::from_parts(&self.config, queue, spawner, self.sink)?;
        if self.config.autostart {
            scheduler.start();
        }
        Ok(scheduler)
    }
}

/// Build one scheduler per entry of `cfg`, keyed and named by map key.
pub fn build_schedulers<S, FS>(
    cfg: &ThrottleConfig,
    spawner: S,
    mut sink_factory: FS,
) -> Result<HashMap<String, Scheduler<S>>, SchedulerError>
where
    S: Spawn + Clone + Send + Sync + 'static,
    FS: FnMut(&str, &SchedulerConfig) -> Option<Arc<dyn DiagnosticSink>>,
{
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let mut schedulers = HashMap::new();
    for (name, scheduler_cfg) in &cfg.schedulers {
        let config = SchedulerConfig {
            name: name.clone(),
            ..scheduler_cfg.clone()
        };
        let mut builder = SchedulerBuilder::new(config);
        if let Some(sink) = sink_factory(name, scheduler_cfg) {
            builder = builder.sink(sink);
        }
        schedulers.insert(name.clone(), builder.build(spawner.clone())?);
    }

    Ok(schedulers)
}

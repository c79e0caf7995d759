//! Bounded-concurrency scheduler: state machine, admission loop and
//! completion bookkeeping.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::core::diagnostics::{DiagnosticKind, DiagnosticSink, Diagnostics};
use crate::core::task::TaskBody;
use crate::core::{CompletionSignal, SchedulerError, Task, WorkId, WorkItem};
use crate::infra::queue::memory::InMemoryQueue;
use crate::util::clock::now_ms;

/// Concurrency limit used when none is configured.
pub const DEFAULT_LIMIT: usize = 3;

/// Whether the admission loop may dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Initial state; queued work waits.
    Idle,
    /// Admission loop is active.
    Running,
}

/// An item a queue refused to take, handed back with the reason.
///
/// The scheduler drops `item` only after its state lock is released, since
/// the task may own a completion signal of the same scheduler.
#[derive(Debug)]
pub struct Rejected {
    /// The refused item, untouched.
    pub item: WorkItem,
    /// Why it was refused.
    pub error: SchedulerError,
}

/// Abstraction for pending-work storage. Dispatch order is dequeue order.
///
/// Implementations must never drop a [`WorkItem`] they were handed except
/// through `dequeue`, `remove` or `drain`: every method runs under the
/// scheduler's state lock.
pub trait WorkQueue: Send {
    /// Append an item at the tail, or hand it back.
    fn enqueue(&mut self, item: WorkItem) -> Result<(), Rejected>;
    /// Pop the head item.
    fn dequeue(&mut self) -> Option<WorkItem>;
    /// Remove the first item carrying `id`.
    fn remove(&mut self, id: WorkId) -> Option<WorkItem>;
    /// Remove every item, oldest first.
    fn drain(&mut self) -> Vec<WorkItem>;
    /// Maximum depth allowed for this queue, if bounded.
    fn max_depth(&self) -> Option<usize>;
    /// Current depth.
    fn len(&self) -> usize;
    /// True when nothing is waiting.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a future to run to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Point-in-time view of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Scheduler name.
    pub name: String,
    /// Current status.
    pub status: Status,
    /// Concurrency ceiling.
    pub limit: usize,
    /// Dispatched but not yet completed.
    pub running: usize,
    /// Waiting in the queue.
    pub queued: usize,
    /// Total accepted submissions.
    pub submitted: u64,
    /// Total dispatches.
    pub dispatched: u64,
    /// Total completion signals fired.
    pub completed: u64,
    /// Total items removed by `cancel` or `clear`, plus items the runtime
    /// dropped before they started.
    pub cancelled: u64,
    /// Queue bound, if any.
    pub max_queue_depth: Option<usize>,
    /// Set once the spawner dropped a task without running it. A closed
    /// scheduler keeps its queue but never dispatches again.
    pub closed: bool,
}

struct State<Q> {
    status: Status,
    queue: Q,
    running: usize,
    next_seq: u64,
    submitted: u64,
    dispatched: u64,
    completed: u64,
    cancelled: u64,
    closed: bool,
    // Only one admission pass dispatches at a time. A caller that finds a
    // pass in progress sets `readmit` and leaves the work to that pass.
    admitting: bool,
    readmit: bool,
}

struct Shared<S, Q> {
    name: String,
    limit: usize,
    state: Mutex<State<Q>>,
    diagnostics: Diagnostics,
    spawner: S,
}

/// Runs at most `limit` tasks at once and queues the rest in submission order.
///
/// The handle is cheap to clone; all clones drive the same scheduler. State
/// lives behind a single `parking_lot::Mutex`. Dispatch, diagnostics and
/// completion continuations always run with the lock released, so a task may
/// complete synchronously or call back into the scheduler.
///
/// ```rust,ignore
/// let scheduler = Scheduler::new(2)?;
/// for url in urls {
///     scheduler.submit(Task::from_future(fetch(url)))?;
/// }
/// scheduler.start();
/// ```
pub struct Scheduler<S, Q = InMemoryQueue> {
    shared: Arc<Shared<S, Q>>,
}

impl<S, Q> Clone for Scheduler<S, Q> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> Scheduler<S, InMemoryQueue>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Scheduler with an unbounded in-memory queue.
    pub fn with_spawner(limit: usize, spawner: S) -> Result<Self, SchedulerError> {
        let config = SchedulerConfig {
            limit,
            ..SchedulerConfig::default()
        };
        Self::from_parts(&config, InMemoryQueue::new(), spawner, None)
    }
}

impl<S, Q> Scheduler<S, Q>
where
    S: Spawn + Send + Sync + 'static,
    Q: WorkQueue + 'static,
{
    /// Assemble a scheduler from validated configuration and components.
    ///
    /// The queue enforces its own bound. When `config.max_queue_depth` is set
    /// it must equal `queue.max_depth()`, otherwise this fails with
    /// [`SchedulerError::InvalidConfig`]; when unset, whatever bound the queue
    /// carries applies. `config.autostart` is left to the caller (see
    /// [`SchedulerBuilder`](crate::builders::SchedulerBuilder)).
    pub fn from_parts(
        config: &SchedulerConfig,
        queue: Q,
        spawner: S,
        sink: Option<Arc<dyn DiagnosticSink>>,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        if config.max_queue_depth.is_some() && config.max_queue_depth != queue.max_depth() {
            return Err(SchedulerError::InvalidConfig(format!(
                "max_queue_depth {:?} does not match the queue bound {:?}",
                config.max_queue_depth,
                queue.max_depth()
            )));
        }
        tracing::debug!(scheduler = %config.name, limit = config.limit, "scheduler created");
        Ok(Self {
            shared: Arc::new(Shared {
                name: config.name.clone(),
                limit: config.limit,
                state: Mutex::new(State {
                    status: Status::Idle,
                    queue,
                    running: 0,
                    next_seq: 0,
                    submitted: 0,
                    dispatched: 0,
                    completed: 0,
                    cancelled: 0,
                    closed: false,
                    admitting: false,
                    readmit: false,
                }),
                diagnostics: Diagnostics::new(config.diagnostics, sink),
                spawner,
            }),
        })
    }

    /// Queue a task. Dispatches it right away if the scheduler is running and
    /// a slot is free. On error the queue is unchanged and the task is dropped
    /// with the lock released.
    ///
    /// Fails with [`SchedulerError::QueueFull`] when a bounded queue is full
    /// and [`SchedulerError::Runtime`] once the scheduler is closed.
    pub fn submit(&self, task: Task) -> Result<WorkId, SchedulerError> {
        let accepted = {
            let mut state = self.shared.state.lock();
            let id = WorkId {
                created_at_ms: now_ms(),
                seq: state.next_seq,
            };
            let item = WorkItem { id, task };
            let enqueued = if state.closed {
                Err(Rejected {
                    item,
                    error: SchedulerError::Runtime(
                        "spawner dropped queued work, scheduler is closed".into(),
                    ),
                })
            } else {
                state.queue.enqueue(item)
            };
            match enqueued {
                Ok(()) => {
                    state.next_seq += 1;
                    state.submitted += 1;
                    Ok((id, state.status == Status::Running && state.running < self.shared.limit))
                }
                Err(rejected) => Err(rejected),
            }
        };
        let (id, admit) = match accepted {
            Ok(accepted) => accepted,
            Err(Rejected { item, error }) => {
                drop(item);
                tracing::warn!(scheduler = %self.shared.name, "submission rejected: {}", error);
                return Err(error);
            }
        };
        tracing::debug!(scheduler = %self.shared.name, task = %id, "task enqueued");

        if admit {
            Self::admit(&self.shared);
        }
        Ok(id)
    }

    /// Submit a task that only waits for `duration`.
    ///
    /// Mostly useful with a limit of 1, where it spaces out the tasks around it.
    #[cfg(feature = "tokio-runtime")]
    pub fn schedule_delay(&self, duration: std::time::Duration) -> Result<WorkId, SchedulerError> {
        self.submit(Task::delay(duration))
    }

    /// Remove a queued item. Returns false if it was unknown or already dispatched.
    pub fn cancel(&self, id: WorkId) -> bool {
        let removed = {
            let mut state = self.shared.state.lock();
            let removed = state.queue.remove(id);
            if removed.is_some() {
                state.cancelled += 1;
            }
            removed
        };
        // Dropping the task outside the lock; its captures may do arbitrary work.
        let found = removed.is_some();
        drop(removed);
        tracing::debug!(scheduler = %self.shared.name, task = %id, found, "cancel");
        found
    }

    /// Drop every queued item. In-flight tasks are not affected.
    pub fn clear(&self) -> usize {
        let drained = {
            let mut state = self.shared.state.lock();
            let drained = state.queue.drain();
            state.cancelled += drained.len() as u64;
            drained
        };
        let removed = drained.len();
        drop(drained);
        tracing::debug!(scheduler = %self.shared.name, removed, "queue cleared");
        removed
    }

    /// `Idle -> Running`, then admit as much queued work as fits.
    /// No-op when already running.
    pub fn start(&self) {
        let started = {
            let mut state = self.shared.state.lock();
            if state.status == Status::Idle {
                state.status = Status::Running;
                true
            } else {
                false
            }
        };
        if started {
            tracing::info!(scheduler = %self.shared.name, "scheduler started");
            Self::admit(&self.shared);
        }
    }

    /// `Running -> Idle`. In-flight tasks keep running and still release
    /// their slots; nothing new is dispatched until [`start`](Self::start).
    pub fn stop(&self) {
        let stopped = {
            let mut state = self.shared.state.lock();
            if state.status == Status::Running {
                state.status = Status::Idle;
                true
            } else {
                false
            }
        };
        if stopped {
            tracing::info!(scheduler = %self.shared.name, "scheduler stopped");
        }
    }

    /// Alias for [`stop`](Self::stop).
    pub fn pause(&self) {
        self.stop();
    }

    /// Alias for [`start`](Self::start).
    pub fn resume(&self) {
        self.start();
    }

    /// Toggle per-task dispatched/completed events.
    pub fn set_diagnostics(&self, enabled: bool) {
        self.shared.diagnostics.set_enabled(enabled);
    }

    /// Whether per-task events are emitted.
    pub fn diagnostics_enabled(&self) -> bool {
        self.shared.diagnostics.is_enabled()
    }

    /// Scheduler name used in logs and events.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Concurrency ceiling.
    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.shared.state.lock().status
    }

    /// Dispatched tasks whose completion has not fired yet.
    pub fn running(&self) -> usize {
        self.shared.state.lock().running
    }

    /// Items waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// True once the spawner dropped a task without running it, which is
    /// what a shut-down tokio runtime does.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Snapshot of status and counters.
    pub fn stats(&self) -> SchedulerStats {
        let state = self.shared.state.lock();
        SchedulerStats {
            name: self.shared.name.clone(),
            status: state.status,
            limit: self.shared.limit,
            running: state.running,
            queued: state.queue.len(),
            submitted: state.submitted,
            dispatched: state.dispatched,
            completed: state.completed,
            cancelled: state.cancelled,
            max_queue_depth: state.queue.max_depth(),
            closed: state.closed,
        }
    }

    /// Admission loop. Takes every item that fits under the limit while
    /// running, then dispatches them in queue order with the lock released.
    ///
    /// Completions that arrive during a pass, including ones fired from
    /// inside `spawn`, only flag `readmit`; the pass in progress loops instead
    /// of recursing.
    fn admit(shared: &Arc<Shared<S, Q>>) {
        loop {
            let batch = {
                let mut state = shared.state.lock();
                if state.admitting {
                    state.readmit = true;
                    return;
                }
                let mut batch = Vec::new();
                while state.status == Status::Running
                    && !state.closed
                    && state.running < shared.limit
                {
                    let Some(item) = state.queue.dequeue() else {
                        break;
                    };
                    state.running += 1;
                    state.dispatched += 1;
                    batch.push(item);
                }
                if batch.is_empty() {
                    return;
                }
                state.admitting = true;
                batch
            };

            for item in batch {
                Self::dispatch(shared, item);
            }

            let mut state = shared.state.lock();
            state.admitting = false;
            if !std::mem::take(&mut state.readmit) {
                return;
            }
        }
    }

    fn dispatch(shared: &Arc<Shared<S, Q>>, item: WorkItem) {
        let WorkItem { id, task } = item;
        let launch = Launch {
            shared: Arc::clone(shared),
            id,
            armed: true,
        };

        match task.into_body() {
            TaskBody::Future(fut) => shared.spawner.spawn(async move {
                let signal = launch.fire();
                fut.await;
                signal.complete();
            }),
            TaskBody::Signal(f) => shared.spawner.spawn(async move { f(launch.fire()) }),
        }
    }

    /// Completion continuation: free the slot, then try to admit more.
    fn on_complete(shared: &Arc<Shared<S, Q>>, id: WorkId) {
        {
            let mut state = shared.state.lock();
            debug_assert!(state.running > 0, "completion without a running task");
            state.running = state.running.saturating_sub(1);
            state.completed += 1;
        }
        shared
            .diagnostics
            .emit(&shared.name, id, DiagnosticKind::Completed);
        Self::admit(shared);
    }

    /// The spawner dropped a dispatched task before polling it. The task
    /// never ran, so the dispatch is undone and counted as a cancellation,
    /// and the scheduler stops dispatching for good.
    fn on_abandoned(shared: &Arc<Shared<S, Q>>, id: WorkId) {
        let queued = {
            let mut state = shared.state.lock();
            state.running = state.running.saturating_sub(1);
            state.dispatched = state.dispatched.saturating_sub(1);
            state.cancelled += 1;
            state.closed = true;
            state.queue.len()
        };
        tracing::warn!(
            scheduler = %shared.name,
            task = %id,
            queued,
            "spawner dropped a task before it started, scheduler closed"
        );
    }
}

/// Travels inside every spawned future. Firing it on first poll marks the
/// task as started and yields its completion signal. Dropping it unfired
/// means the spawner discarded the task without running it.
struct Launch<S, Q>
where
    S: Spawn + Send + Sync + 'static,
    Q: WorkQueue + 'static,
{
    shared: Arc<Shared<S, Q>>,
    id: WorkId,
    armed: bool,
}

impl<S, Q> Launch<S, Q>
where
    S: Spawn + Send + Sync + 'static,
    Q: WorkQueue + 'static,
{
    fn fire(mut self) -> CompletionSignal {
        self.armed = false;
        let id = self.id;
        self.shared
            .diagnostics
            .emit(&self.shared.name, id, DiagnosticKind::Dispatched);
        let owner = Arc::clone(&self.shared);
        CompletionSignal::new(id, move || Scheduler::<S, Q>::on_complete(&owner, id))
    }
}

impl<S, Q> Drop for Launch<S, Q>
where
    S: Spawn + Send + Sync + 'static,
    Q: WorkQueue + 'static,
{
    fn drop(&mut self) {
        if self.armed {
            Scheduler::<S, Q>::on_abandoned(&self.shared, self.id);
        }
    }
}

#[cfg(feature = "tokio-runtime")]
mod tokio_constructors {
    use super::{Scheduler, SchedulerError, DEFAULT_LIMIT};
    use crate::config::SchedulerConfig;
    use crate::infra::queue::memory::InMemoryQueue;
    use crate::runtime::TokioSpawner;

    impl Scheduler<TokioSpawner> {
        /// Scheduler on the current tokio runtime.
        ///
        /// Fails with [`SchedulerError::Runtime`] outside a runtime and
        /// [`SchedulerError::InvalidConfig`] when `limit` is 0.
        pub fn new(limit: usize) -> Result<Self, SchedulerError> {
            Self::with_spawner(limit, TokioSpawner::current()?)
        }

        /// Scheduler with [`DEFAULT_LIMIT`] slots.
        pub fn with_default_limit() -> Result<Self, SchedulerError> {
            Self::new(DEFAULT_LIMIT)
        }

        /// Strictly serial scheduler, equivalent to `new(1)`.
        pub fn single_worker() -> Result<Self, SchedulerError> {
            Self::new(1)
        }

        /// Build from configuration on the current runtime, honoring
        /// `max_queue_depth`, `diagnostics` and `autostart`.
        pub fn from_config(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
            let queue = config
                .max_queue_depth
                .map_or_else(InMemoryQueue::new, InMemoryQueue::bounded);
            let scheduler = Self::from_parts(config, queue, TokioSpawner::current()?, None)?;
            if config.autostart {
                scheduler.start();
            }
            Ok(scheduler)
        }
    }
}

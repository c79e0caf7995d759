//! Units of work, their identifiers, and the completion signal.

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::executor::Job;

/// Boxed future driven to completion by a dispatched task.
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type SignalFn = Box<dyn FnOnce(CompletionSignal) + Send + 'static>;
type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

/// Identifier handed back by `submit`.
///
/// `seq` is strictly increasing per scheduler and assigned in queue order, so
/// ids never collide within one scheduler and compare in submission order.
/// `created_at_ms` is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkId {
    /// Wall-clock submission time in milliseconds since epoch.
    pub created_at_ms: u128,
    /// Per-scheduler submission sequence number.
    pub seq: u64,
}

impl Ord for WorkId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq
            .cmp(&other.seq)
            .then_with(|| self.created_at_ms.cmp(&other.created_at_ms))
    }
}

impl PartialOrd for WorkId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.created_at_ms, self.seq)
    }
}

pub(crate) enum TaskBody {
    Future(TaskFuture),
    Signal(SignalFn),
}

/// An opaque unit of asynchronous work.
///
/// Every constructor yields something that reports completion exactly once:
/// either a future (completion = resolution) or a callable that receives a
/// [`CompletionSignal`] and must consume it.
pub struct Task {
    body: TaskBody,
}

impl Task {
    /// Task that completes when `fut` resolves.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            body: TaskBody::Future(Box::pin(fut)),
        }
    }

    /// Callback-style task. `f` is invoked on dispatch and owns the signal;
    /// the slot is held until the signal is completed or dropped.
    ///
    /// ```rust,ignore
    /// let task = Task::with_signal(|done| {
    ///     std::thread::spawn(move || {
    ///         fetch_blocking();
    ///         done.complete();
    ///     });
    /// });
    /// ```
    pub fn with_signal<F>(f: F) -> Self
    where
        F: FnOnce(CompletionSignal) + Send + 'static,
    {
        Self {
            body: TaskBody::Signal(Box::new(f)),
        }
    }

    /// Task driven by a [`Job`] implementation.
    pub fn from_job<J: Job>(job: J) -> Self {
        Self {
            body: TaskBody::Future(job.run()),
        }
    }

    /// Task that does nothing but wait for `duration`.
    #[cfg(feature = "tokio-runtime")]
    pub fn delay(duration: std::time::Duration) -> Self {
        Self::from_future(tokio::time::sleep(duration))
    }

    pub(crate) fn into_body(self) -> TaskBody {
        self.body
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            TaskBody::Future(_) => "future",
            TaskBody::Signal(_) => "signal",
        };
        f.debug_struct("Task").field("kind", &kind).finish()
    }
}

/// Queue-resident pairing of a task with its identifier.
#[derive(Debug)]
pub struct WorkItem {
    /// Identifier returned to the submitter.
    pub id: WorkId,
    /// The pending work.
    pub task: Task,
}

/// Move-only token a dispatched task uses to report it has finished.
///
/// Releasing happens once: on [`complete`](Self::complete), or on drop if the
/// task discarded the signal (including unwinding out of a panicked task).
/// A signal that is leaked keeps its slot occupied for the scheduler's lifetime.
pub struct CompletionSignal {
    id: WorkId,
    release: Option<ReleaseFn>,
}

impl CompletionSignal {
    pub(crate) fn new<F>(id: WorkId, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    /// Id of the work item this signal belongs to.
    pub const fn id(&self) -> WorkId {
        self.id
    }

    /// Report completion and free the slot.
    pub fn complete(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::warn!(task = %self.id, "completion signal dropped without complete(), releasing slot");
            release();
        }
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("id", &self.id)
            .field("fired", &self.release.is_none())
            .finish()
    }
}

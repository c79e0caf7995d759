//! Scheduling engine: tasks, queue seam, admission control and diagnostics.

pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod scheduler;
pub mod task;

pub use diagnostics::{
    build_diagnostic_event, DiagnosticEvent, DiagnosticKind, DiagnosticSink,
    InMemoryDiagnosticSink,
};
pub use error::{AppResult, SchedulerError};
pub use executor::Job;
pub use scheduler::{
    Rejected, Scheduler, SchedulerStats, Spawn, Status, WorkQueue, DEFAULT_LIMIT,
};
pub use task::{CompletionSignal, Task, TaskFuture, WorkId, WorkItem};

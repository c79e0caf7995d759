//! Per-task diagnostic events.
//!
//! When diagnostics are switched on for a scheduler, each task produces a
//! `dispatched` and a `completed` event. Events go to `tracing` at debug level
//! and to an optional [`DiagnosticSink`]. Emission never feeds back into
//! scheduling.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::WorkId;
use crate::util::clock::now_ms;

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Task left the queue and was handed to the runtime.
    Dispatched,
    /// Task's completion signal fired.
    Completed,
}

/// A single diagnostic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    /// Name of the emitting scheduler.
    pub scheduler: String,
    /// Task identifier.
    pub task: WorkId,
    /// Event kind.
    pub kind: DiagnosticKind,
    /// Timestamp milliseconds.
    pub at_ms: u128,
}

/// Receiver for diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    /// Record an event. Called outside the scheduler's state lock.
    fn record(&self, event: DiagnosticEvent);
}

/// Bounded in-memory sink for tests and development.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to the scheduler.
#[derive(Clone)]
pub struct InMemoryDiagnosticSink {
    events: Arc<Mutex<VecDeque<DiagnosticEvent>>>,
    max_events: usize,
}

impl InMemoryDiagnosticSink {
    /// Create a sink that keeps the most recent `max_events` events.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Ids of events of one kind, in emission order.
    pub fn ids(&self, kind: DiagnosticKind) -> Vec<WorkId> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.task)
            .collect()
    }

    /// Drop all stored events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for InMemoryDiagnosticSink {
    fn record(&self, event: DiagnosticEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build a diagnostic event stamped with the current time.
pub fn build_diagnostic_event(
    scheduler: impl Into<String>,
    task: WorkId,
    kind: DiagnosticKind,
) -> DiagnosticEvent {
    DiagnosticEvent {
        scheduler: scheduler.into(),
        task,
        kind,
        at_ms: now_ms(),
    }
}

/// Switch plus optional sink owned by one scheduler.
pub(crate) struct Diagnostics {
    enabled: AtomicBool,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl Diagnostics {
    pub(crate) fn new(enabled: bool, sink: Option<Arc<dyn DiagnosticSink>>) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            sink,
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn emit(&self, scheduler: &str, task: WorkId, kind: DiagnosticKind) {
        if !self.is_enabled() {
            return;
        }
        match kind {
            DiagnosticKind::Dispatched => tracing::debug!(scheduler, %task, "start task"),
            DiagnosticKind::Completed => tracing::debug!(scheduler, %task, "finish task"),
        }
        if let Some(sink) = &self.sink {
            sink.record(build_diagnostic_event(scheduler, task, kind));
        }
    }
}

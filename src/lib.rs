//! # Prometheus Throttle
//!
//! A bounded-concurrency task scheduler for client-side asynchronous work.
//!
//! Callers submit tasks; the scheduler runs at most `limit` of them at once and
//! parks the rest in a FIFO queue until a slot frees up. Submission never
//! blocks the caller. "Concurrency" here is the number of in-flight
//! asynchronous operations (network calls, uploads, model requests), not CPU
//! threads.
//!
//! ## Key Features
//!
//! - **Admission control**: at most `limit` tasks in flight, strict FIFO admission
//! - **Start/stop**: pause dispatching without touching in-flight work
//! - **Pre-dispatch cancellation**: `cancel(id)` and `clear()` on queued work
//! - **Two task shapes**: futures, or callables that receive a [`core::CompletionSignal`]
//! - **Diagnostics**: optional per-task dispatched/completed events
//! - **Configuration**: JSON and `THROTTLE_*` environment variables
//!
//! ## Example
//!
//! ```rust,ignore
//! use prometheus_throttle::core::{Scheduler, Task};
//! use std::time::Duration;
//!
//! let scheduler = Scheduler::new(2)?;
//! let first = scheduler.submit(Task::from_future(async { /* request */ }))?;
//! scheduler.schedule_delay(Duration::from_millis(250))?;
//! scheduler.submit(Task::with_signal(|done| {
//!     std::thread::spawn(move || {
//!         // blocking client call
//!         done.complete();
//!     });
//! }))?;
//! scheduler.cancel(first);
//! scheduler.start();
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Scheduling engine: tasks, admission control, diagnostics.
pub mod core;
/// Configuration models for schedulers.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Work queue backends.
pub mod infra;
/// Runtime adapters.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;

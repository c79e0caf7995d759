//! Job trait for structured task bodies.

use async_trait::async_trait;

/// A self-contained piece of asynchronous work.
///
/// Implement this when a task carries its own inputs and is easier to express
/// as a type than as a closure. Convert with [`Task::from_job`](super::Task::from_job).
/// Completion is reported when `run` returns; failures are the job's own
/// business and should be handled (or retried by resubmitting) inside `run`.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_throttle::core::{Job, Task};
///
/// struct Fetch {
///     url: String,
/// }
///
/// #[async_trait]
/// impl Job for Fetch {
///     async fn run(self) {
///         let _ = reqwest::get(&self.url).await;
///     }
/// }
///
/// scheduler.submit(Task::from_job(Fetch { url: "https://example.com".into() }))?;
/// ```
#[async_trait]
pub trait Job: Send + 'static {
    /// Perform the work. The slot is released once this future resolves.
    async fn run(self);
}

//! Infrastructure adapters for work queues.

pub mod queue;
pub use queue::InMemoryQueue;

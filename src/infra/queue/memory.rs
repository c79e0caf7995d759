//! In-memory FIFO work queue.

use std::collections::VecDeque;

use crate::core::{Rejected, SchedulerError, WorkId, WorkItem, WorkQueue};

/// In-memory queue storing work items in submission order.
/// Enqueue and dequeue are O(1); removal by id is O(n).
pub struct InMemoryQueue {
    max_depth: Option<usize>,
    items: VecDeque<WorkItem>,
}

impl InMemoryQueue {
    /// Create an unbounded queue.
    pub fn new() -> Self {
        Self {
            max_depth: None,
            items: VecDeque::new(),
        }
    }

    /// Create a queue that rejects items beyond `max_depth`.
    pub fn bounded(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            items: VecDeque::with_capacity(max_depth.min(1024)),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue for InMemoryQueue {
    fn enqueue(&mut self, item: WorkItem) -> Result<(), Rejected> {
        if let Some(max) = self.max_depth {
            if self.items.len() >= max {
                return Err(Rejected {
                    item,
                    error: SchedulerError::QueueFull(format!("max queue depth {max} reached")),
                });
            }
        }
        self.items.push_back(item);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    fn remove(&mut self, id: WorkId) -> Option<WorkItem> {
        // First match wins.
        let pos = self.items.iter().position(|item| item.id == id)?;
        self.items.remove(pos)
    }

    fn drain(&mut self) -> Vec<WorkItem> {
        self.items.drain(..).collect()
    }

    fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

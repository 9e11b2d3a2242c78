//! Registry of pending scheduled tasks.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::handler::HandlerResult;

/// Identifier handed out by [`Scheduler::schedule`](super::Scheduler::schedule).
pub type TaskId = u64;

/// Deferred work run by the scheduler worker.
pub type TaskAction = Box<dyn FnOnce() -> HandlerResult + Send + 'static>;

/// A task waiting for its deadline.
pub struct ScheduledTask {
    pub id: TaskId,
    pub fire_at: Instant,
    pub action: TaskAction,
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("id", &self.id)
            .field("fire_at", &self.fire_at)
            .finish_non_exhaustive()
    }
}

/// Table of pending tasks.
///
/// Holds exactly the tasks that have neither fired nor been cancelled. A task
/// leaves the table once, through [`TaskRegistry::take`].
#[derive(Debug, Default)]
pub struct TaskRegistry {
    next_id: TaskId,
    pending: HashMap<TaskId, ScheduledTask>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Register a task and return its fresh id.
    pub fn insert(&mut self, fire_at: Instant, action: TaskAction) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(
            id,
            ScheduledTask {
                id,
                fire_at,
                action,
            },
        );
        id
    }

    /// Remove a pending task, returning it if it was still pending.
    pub fn take(&mut self, id: TaskId) -> Option<ScheduledTask> {
        self.pending.remove(&id)
    }

    /// Drop every pending task, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Pending ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<_> = self.pending.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

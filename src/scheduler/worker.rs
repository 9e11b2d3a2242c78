//! Scheduler handle and its worker task.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::handler::{isolate, HandlerResult};

use super::{ScheduledTask, TaskId, TaskRegistry};

type Deadline = Reverse<(Instant, TaskId)>;

/// Deadline used when `now + delay` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Cloneable handle for scheduling and cancelling delayed tasks.
///
/// All clones share one registry and one worker.
#[derive(Debug, Clone)]
pub struct Scheduler {
    registry: Arc<Mutex<TaskRegistry>>,
    wake_tx: mpsc::UnboundedSender<(Instant, TaskId)>,
}

impl Scheduler {
    /// Spawn the worker and return a handle to it.
    ///
    /// The worker exits when `cancel` is cancelled; tasks still pending at
    /// that point never fire.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(cancel: CancellationToken) -> Self {
        let registry = Arc::new(Mutex::new(TaskRegistry::new()));
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(Arc::clone(&registry), wake_rx, cancel));
        Self { registry, wake_tx }
    }

    /// Run `action` once after `delay`, unless cancelled first.
    ///
    /// Returns immediately with the task's id.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn schedule<F>(&self, delay: Duration, action: F) -> TaskId
    where
        F: FnOnce() -> HandlerResult + Send + 'static,
    {
        let now = Instant::now();
        let fire_at = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);
        let id = self
            .registry
            .lock()
            .expect("Mutex poisoned")
            .insert(fire_at, Box::new(action));

        if self.wake_tx.send((fire_at, id)).is_err() {
            tracing::warn!(task_id = id, "Scheduler worker stopped, dropping task");
            let _ = self.registry.lock().expect("Mutex poisoned").take(id);
        } else {
            tracing::debug!(task_id = id, delay_ms = delay.as_millis(), "Task scheduled");
        }
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was pending. Cancelling a task that already
    /// fired or was already cancelled does nothing and returns `false`.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn cancel(&self, id: TaskId) -> bool {
        let task = self.registry.lock().expect("Mutex poisoned").take(id);
        let cancelled = task.is_some();
        if cancelled {
            tracing::debug!(task_id = id, "Task cancelled");
        }
        cancelled
    }

    /// Whether the task is still waiting to fire.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.registry.lock().expect("Mutex poisoned").contains(id)
    }

    /// Ids of all pending tasks, ascending.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn pending(&self) -> Vec<TaskId> {
        self.registry.lock().expect("Mutex poisoned").ids()
    }
}

async fn run_worker(
    registry: Arc<Mutex<TaskRegistry>>,
    mut wake_rx: mpsc::UnboundedReceiver<(Instant, TaskId)>,
    cancel: CancellationToken,
) {
    let mut deadlines: BinaryHeap<Deadline> = BinaryHeap::new();
    let mut open = true;

    loop {
        let next = deadlines.peek().map(|Reverse((at, _))| *at);

        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                let dropped = registry.lock().expect("Mutex poisoned").clear();
                tracing::debug!(dropped, "Scheduler worker shutting down");
                break;
            }

            wake = wake_rx.recv(), if open => {
                match wake {
                    Some(deadline) => deadlines.push(Reverse(deadline)),
                    None => open = false,
                }
            }

            () = tokio::time::sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
                fire_due(&registry, &mut deadlines);
            }
        }

        if !open && deadlines.is_empty() {
            tracing::debug!("All scheduler handles dropped, worker exiting");
            break;
        }
    }
}

fn fire_due(registry: &Mutex<TaskRegistry>, deadlines: &mut BinaryHeap<Deadline>) {
    let now = Instant::now();
    while let Some(&Reverse((at, id))) = deadlines.peek() {
        if at > now {
            break;
        }
        deadlines.pop();

        let task = registry.lock().expect("Mutex poisoned").take(id);
        match task {
            Some(task) => run_task(task),
            None => tracing::trace!(task_id = id, "Skipping cancelled task"),
        }
    }
}

fn run_task(task: ScheduledTask) {
    let id = task.id;
    match isolate(task.action) {
        Ok(()) => tracing::debug!(task_id = id, "Task fired"),
        Err(e) => tracing::warn!(task_id = id, error = %e, "Scheduled task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::handler::HandlerError;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[tokio::test]
    async fn test_task_fires_once_and_leaves_registry() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let hits = counter();
        let h = Arc::clone(&hits);

        let id = scheduler.schedule(Duration::from_millis(20), move || {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(scheduler.is_pending(id));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending(id));
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_deadline_skips_action() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let hits = counter();
        let h = Arc::clone(&hits);

        let id = scheduler.schedule(Duration::from_millis(100), move || {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(scheduler.cancel(id));
        assert!(!scheduler.is_pending(id));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let id = scheduler.schedule(Duration::from_secs(60), || Ok(()));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
    }

    #[tokio::test]
    async fn test_cancel_after_fire_is_noop() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let id = scheduler.schedule(Duration::from_millis(10), || Ok(()));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!scheduler.cancel(id));
    }

    #[tokio::test]
    async fn test_tasks_fire_in_deadline_order() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        for (label, delay) in [("late", 80), ("early", 20), ("middle", 50)] {
            let order = Arc::clone(&order);
            scheduler.schedule(Duration::from_millis(delay), move || {
                order.lock().unwrap().push(label);
                Ok(())
            });
        }

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*order.lock().unwrap(), vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn test_failing_task_does_not_stop_worker() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let hits = counter();
        let h = Arc::clone(&hits);

        scheduler.schedule(Duration::from_millis(10), || {
            Err(HandlerError::failed("nope"))
        });
        scheduler.schedule(Duration::from_millis(15), || panic!("task panicked"));
        scheduler.schedule(Duration::from_millis(30), move || {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_pending_tasks() {
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::start(cancel.clone());
        let hits = counter();
        let h = Arc::clone(&hits);

        scheduler.schedule(Duration::from_millis(50), move || {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        cancel.cancel();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_clears_pending_ids() {
        let cancel = CancellationToken::new();
        let scheduler = Scheduler::start(cancel.clone());
        let id = scheduler.schedule(Duration::from_secs(60), || Ok(()));
        assert!(scheduler.is_pending(id));

        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!scheduler.is_pending(id));
        assert!(scheduler.pending().is_empty());
        assert!(!scheduler.cancel(id));
    }

    #[tokio::test]
    async fn test_huge_delay_is_accepted() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let id = scheduler.schedule(Duration::MAX, || Ok(()));
        assert!(scheduler.is_pending(id));
        let other = scheduler.schedule(Duration::from_secs(u64::MAX / 2), || Ok(()));
        assert!(scheduler.is_pending(other));
        assert!(scheduler.cancel(id));
    }
}

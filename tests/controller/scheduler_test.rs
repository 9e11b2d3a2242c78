//! Scheduler cancellation scenarios.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mcserver_control::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn cancel_within_one_second_prevents_action() {
    let scheduler = Scheduler::start(CancellationToken::new());
    let ran = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&ran);
    let id = scheduler.schedule(Duration::from_secs(2), move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(scheduler.cancel(id));
    assert!(!scheduler.is_pending(id));
    assert!(!scheduler.pending().contains(&id));

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!ran.load(Ordering::SeqCst));
    assert!(!scheduler.cancel(id));
}

#[tokio::test(start_paused = true)]
async fn cancelling_fired_task_is_noop() {
    let scheduler = Scheduler::start(CancellationToken::new());
    let ran = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&ran);
    let id = scheduler.schedule(Duration::from_secs(1), move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(ran.load(Ordering::SeqCst));
    assert!(!scheduler.cancel(id));
    assert!(scheduler.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_pending_tasks() {
    let cancel = CancellationToken::new();
    let scheduler = Scheduler::start(cancel.clone());
    let ran = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&ran);
    scheduler.schedule(Duration::from_secs(1), move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });
    cancel.cancel();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!ran.load(Ordering::SeqCst));
}

//! End-to-end tests for the controller pipeline.

mod dispatch_test;
mod event_test;
mod listener_test;
mod scheduler_test;

use std::path::Path;

use mcserver_control::console::{Console, ConsoleReceiver};
use mcserver_control::context::Context;
use mcserver_control::player::StatusStore;
use mcserver_control::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;

/// A fresh context storing status under `dir`. Needs a Tokio runtime.
pub fn harness(dir: &Path) -> (Context, ConsoleReceiver) {
    let (console, rx) = Console::channel();
    let scheduler = Scheduler::start(CancellationToken::new());
    (Context::new(console, scheduler, StatusStore::new(dir)), rx)
}

/// Commands queued on the console so far.
pub fn drain(rx: &mut ConsoleReceiver) -> Vec<String> {
    let mut sent = Vec::new();
    while let Ok(command) = rx.try_recv() {
        sent.push(command);
    }
    sent
}

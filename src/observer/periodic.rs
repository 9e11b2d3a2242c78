//! Fixed-interval loop driving periodic observers.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::handler::isolate;

/// Default interval between periodic ticks.
pub const DEFAULT_PERIODIC_INTERVAL: Duration = Duration::from_secs(1);

/// Invoke every periodic observer once, in registration order.
///
/// Returns the number of callbacks that failed.
pub fn run_periodic_tick(ctx: &Context) -> usize {
    let mut failed = 0;
    for observer in ctx.observers.periodic() {
        let Some(periodic) = observer.as_periodic() else {
            continue;
        };
        if let Err(e) = isolate(|| periodic.tick(ctx)) {
            failed += 1;
            tracing::warn!(observer = observer.name(), error = %e, "Periodic callback failed");
        }
    }
    failed
}

/// Spawn the periodic loop. It runs until `cancel` fires.
///
/// The first tick happens one `interval` after spawning.
pub fn spawn_periodic_loop(
    ctx: Context,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(interval_ms = interval.as_millis(), "Periodic loop started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    run_periodic_tick(&ctx);
                }
            }
        }
        tracing::debug!("Periodic loop stopped");
    })
}

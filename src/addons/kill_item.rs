//! `kill-item` command: clear dropped items now or after a delay.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::console::{Color, Console};
use crate::context::Context;
use crate::handler::{HandlerError, HandlerResult};
use crate::observer::{CommandObserver, Observer};
use crate::player::Player;
use crate::scheduler::TaskId;

/// Delay used when no argument is given.
pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_secs(60);

fn kill_items(console: &Console) {
    console.send("/kill @e[type=item]");
    console.say("Killed all items.");
}

/// Clears every dropped item, optionally after a delay.
#[derive(Debug)]
pub struct KillItemCommand {
    entry: String,
    aliases: Vec<String>,
    pending: Mutex<Vec<TaskId>>,
}

impl KillItemCommand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry: "kill-item".to_string(),
            aliases: vec!["ki".to_string()],
            pending: Mutex::new(Vec::new()),
        }
    }

    fn schedule(&self, ctx: &Context, delay: Duration) {
        let console = ctx.console.clone();
        let id = ctx.scheduler.schedule(delay, move || {
            kill_items(&console);
            Ok(())
        });

        let mut pending = self.pending.lock().expect("Mutex poisoned");
        pending.retain(|task| ctx.scheduler.is_pending(*task));
        pending.push(id);
    }

    fn cancel_all(&self, ctx: &Context) -> usize {
        let ids: Vec<TaskId> = self.pending.lock().expect("Mutex poisoned").drain(..).collect();
        ids.into_iter()
            .filter(|id| ctx.scheduler.cancel(*id))
            .count()
    }
}

impl Default for KillItemCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for KillItemCommand {
    fn as_command(&self) -> Option<&dyn CommandObserver> {
        Some(self)
    }
}

impl CommandObserver for KillItemCommand {
    fn entry(&self) -> &str {
        &self.entry
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn help(&self) -> String {
        format!(
            "Kill all items, usage: {} [now/<delay>/cancel]\nBy default delay=60s",
            self.entry
        )
    }

    fn on_triggered(&self, ctx: &Context, player: &Arc<Player>, args: &[String]) -> HandlerResult {
        match args.first().map(String::as_str) {
            None => {
                ctx.console.say("Will clear items in 1 minute.");
                self.schedule(ctx, DEFAULT_CLEAR_DELAY);
            }
            Some("now") => kill_items(&ctx.console),
            Some("cancel") => {
                let cancelled = self.cancel_all(ctx);
                tracing::info!(player = %player.name(), cancelled, "Item clear cancelled");
                if cancelled > 0 {
                    ctx.console.say("Cancelled pending item clear.");
                } else {
                    ctx.console
                        .tellraw(player, "No pending item clear.", Color::Yellow);
                }
            }
            Some(delay) => {
                let secs: f64 = delay
                    .parse()
                    .map_err(|_| HandlerError::invalid_arguments(format!("bad delay {delay}")))?;
                let wait = Duration::try_from_secs_f64(secs).map_err(|_| {
                    HandlerError::invalid_arguments(format!("delay out of range {delay}"))
                })?;
                ctx.console
                    .say(&format!("Will clear items in {secs:.1} seconds."));
                self.schedule(ctx, wait);
            }
        }
        Ok(())
    }
}

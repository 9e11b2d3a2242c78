//! Online-time reporting and the play-time reminder.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::console::Color;
use crate::context::Context;
use crate::handler::{HandlerError, HandlerResult};
use crate::observer::{CommandObserver, LifecycleObserver, Observer, PeriodicObserver};
use crate::player::{keys, to_unix_secs, Player};

/// Status key: unix seconds of the last reminder.
pub const TIME_LAST_WARN: &str = "time_last_warn";
/// Status key: whether the player wants reminders.
pub const TIME_WARN_FLAG: &str = "time_warn_flag";

const SECS_PER_HOUR: f64 = 3600.0;

fn hours(secs: f64) -> f64 {
    secs / SECS_PER_HOUR
}

/// `online-time` command: show, clear, or toggle reminders.
#[derive(Debug)]
pub struct OnlineTimeCommand {
    entry: String,
    aliases: Vec<String>,
}

impl OnlineTimeCommand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry: "online-time".to_string(),
            aliases: vec!["ot".to_string()],
        }
    }

    fn show(ctx: &Context, player: &Player) {
        let online = player.status().online_time(Local::now());
        let text = format!(
            "Time online: {:.2} hours\nTime today: {:.2} hours\nTotal: {:.2} hours",
            hours(online.session),
            hours(online.today),
            hours(online.total)
        );
        ctx.console.tellraw(player, &text, Color::Yellow);
    }

    fn warn(ctx: &Context, player: &Player, switch: &str) -> HandlerResult {
        let enable = match switch {
            "on" => true,
            "off" => false,
            other => {
                return Err(HandlerError::invalid_arguments(format!(
                    "expected on or off, got {other}"
                )))
            }
        };

        if !player.status().has(TIME_WARN_FLAG) {
            ctx.console
                .tellraw(player, "NO online-time reminder found.", Color::Red);
            return Ok(());
        }

        player.status().set(TIME_WARN_FLAG, enable);
        let text = if enable {
            "Enable online time reminder."
        } else {
            "Disable online time reminder."
        };
        ctx.console.tellraw(player, text, Color::Yellow);
        Ok(())
    }

    fn clear(ctx: &Context, player: &Player) {
        let status = player.status();
        status.set(keys::TIME_ONLINE, 0.0);
        status.set(keys::TIME_ONLINE_TODAY, 0.0);
        if status.has(TIME_WARN_FLAG) {
            RemindAddiction::reset_status(player);
        }
        tracing::info!(player = %player.name(), "Online time cleared");
        ctx.console
            .tellraw(player, "Cleared online-time record", Color::White);
    }
}

impl Default for OnlineTimeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for OnlineTimeCommand {
    fn as_command(&self) -> Option<&dyn CommandObserver> {
        Some(self)
    }
}

impl CommandObserver for OnlineTimeCommand {
    fn entry(&self) -> &str {
        &self.entry
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn help(&self) -> String {
        [
            "Show online time".to_string(),
            format!("Usage: {} [warn on/off] | [clear]", self.entry),
            format!(" - {} : show online time", self.entry),
            format!(" - {} warn off : disable the play-time reminder", self.entry),
            format!(" - {} clear : clear the online time record", self.entry),
        ]
        .join("\n")
    }

    fn on_triggered(&self, ctx: &Context, player: &Arc<Player>, args: &[String]) -> HandlerResult {
        match args {
            [] => {
                Self::show(ctx, player);
                Ok(())
            }
            [action, switch] if action == "warn" => Self::warn(ctx, player, switch),
            [action] if action == "clear" => {
                Self::clear(ctx, player);
                Ok(())
            }
            _ => Err(HandlerError::invalid_arguments(args.join(" "))),
        }
    }
}

/// Reminds players who have been online too long today.
#[derive(Debug, Clone)]
pub struct RemindAddiction {
    tolerance: Duration,
    interval: Duration,
}

impl RemindAddiction {
    /// Warn once `tolerance` of play today has passed, then at most every
    /// `interval`.
    #[must_use]
    pub fn new(tolerance: Duration, interval: Duration) -> Self {
        Self {
            tolerance,
            interval,
        }
    }

    /// Put a player's reminder state back to its defaults.
    pub fn reset_status(player: &Player) {
        player.status().set_tagged(TIME_LAST_WARN, 0.0, true);
        player.status().set_tagged(TIME_WARN_FLAG, true, true);
    }

    fn check(&self, ctx: &Context, player: &Player, now: chrono::DateTime<Local>) {
        let status = player.status();
        let wants_warning = status
            .get(TIME_WARN_FLAG)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !status.is_online() || !wants_warning {
            return;
        }

        let today = status.online_time(now).today;
        let now_secs = to_unix_secs(&now);
        let last_warn = status
            .get(TIME_LAST_WARN)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        if today > self.tolerance.as_secs_f64()
            && now_secs - last_warn > self.interval.as_secs_f64()
        {
            ctx.console.tellraw(
                player,
                &format!(
                    "You have been playing for {:.1} hours today, is it too long?",
                    hours(today)
                ),
                Color::Red,
            );
            status.set(TIME_LAST_WARN, now_secs);
            tracing::debug!(player = %player.name(), today_secs = today, "Play-time reminder sent");
        }
    }
}

impl Default for RemindAddiction {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), Duration::from_secs(1200))
    }
}

impl Observer for RemindAddiction {
    fn as_lifecycle(&self) -> Option<&dyn LifecycleObserver> {
        Some(self)
    }

    fn as_periodic(&self) -> Option<&dyn PeriodicObserver> {
        Some(self)
    }
}

impl LifecycleObserver for RemindAddiction {
    fn on_login(&self, _ctx: &Context, player: &Arc<Player>) -> HandlerResult {
        player.status().setdefault(TIME_LAST_WARN, 0.0, true);
        player.status().setdefault(TIME_WARN_FLAG, true, true);
        Ok(())
    }
}

impl PeriodicObserver for RemindAddiction {
    fn tick(&self, ctx: &Context) -> HandlerResult {
        let now = Local::now();
        for player in ctx.players.online() {
            self.check(ctx, &player, now);
        }
        Ok(())
    }
}

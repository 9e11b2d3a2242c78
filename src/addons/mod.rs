//! Preset observers, switched on and off from the `[addons]` config table.

mod greeting;
mod kill_item;
mod online_time;
mod player_commands;

use std::sync::Arc;
use std::time::Duration;

pub use greeting::*;
pub use kill_item::*;
pub use online_time::*;
pub use player_commands::*;

use crate::config::AddonsConfig;
use crate::observer::Observer;

/// Build the enabled addons, in registration order.
#[must_use]
pub fn addon_observers(config: &AddonsConfig) -> Vec<Arc<dyn Observer>> {
    let mut observers: Vec<Arc<dyn Observer>> = Vec::new();

    if config.welcome {
        observers.push(Arc::new(Welcome));
    }
    if config.goodbye {
        observers.push(Arc::new(Goodbye));
    }
    if config.suicide {
        observers.push(Arc::new(SuicideCommand::new()));
    }
    if config.online_time {
        observers.push(Arc::new(OnlineTimeCommand::new()));
    }
    if config.reminder.enabled {
        observers.push(Arc::new(RemindAddiction::new(
            Duration::from_secs(config.reminder.tolerance_secs),
            Duration::from_secs(config.reminder.interval_secs),
        )));
    }
    if config.kill_item {
        observers.push(Arc::new(KillItemCommand::new()));
    }
    if config.teleport {
        observers.push(Arc::new(TeleportCommand::new()));
    }

    observers
}

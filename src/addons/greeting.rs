//! Join and leave greetings.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::console::{Color, TitleSlot};
use crate::context::Context;
use crate::handler::HandlerResult;
use crate::observer::{LifecycleObserver, Observer};
use crate::player::Player;

const GREETINGS: &[&str] = &["Welcome", "Hello", "Greetings", "你好", "欢迎", "哈咯"];

/// Delay between login and the welcome title.
pub const WELCOME_DELAY: Duration = Duration::from_secs(3);

/// Shows a random greeting title shortly after a player logs in.
#[derive(Debug, Default)]
pub struct Welcome;

impl Observer for Welcome {
    fn as_lifecycle(&self) -> Option<&dyn LifecycleObserver> {
        Some(self)
    }
}

impl LifecycleObserver for Welcome {
    fn on_login(&self, ctx: &Context, player: &Arc<Player>) -> HandlerResult {
        let console = ctx.console.clone();
        let player = Arc::clone(player);
        ctx.scheduler.schedule(WELCOME_DELAY, move || {
            let greeting = GREETINGS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or("Welcome");
            // The subtitle only shows once a title is sent.
            console.title(&player, TitleSlot::Subtitle, player.name(), Color::White);
            console.title(&player, TitleSlot::Title, greeting, Color::Random);
            Ok(())
        });
        Ok(())
    }
}

/// Announces every player leaving.
#[derive(Debug, Default)]
pub struct Goodbye;

impl Observer for Goodbye {
    fn as_lifecycle(&self) -> Option<&dyn LifecycleObserver> {
        Some(self)
    }
}

impl LifecycleObserver for Goodbye {
    fn on_logout(&self, ctx: &Context, player: &Arc<Player>) -> HandlerResult {
        ctx.console.say(&format!("Goodbye, {}", player.name()));
        Ok(())
    }
}

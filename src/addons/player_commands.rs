//! Small commands acting on the calling player.

use std::sync::Arc;

use crate::context::Context;
use crate::handler::{HandlerError, HandlerResult};
use crate::observer::{CommandObserver, Observer};
use crate::player::Player;

/// `suicide`: kill the calling player.
#[derive(Debug)]
pub struct SuicideCommand {
    entry: String,
}

impl SuicideCommand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry: "suicide".to_string(),
        }
    }
}

impl Default for SuicideCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for SuicideCommand {
    fn as_command(&self) -> Option<&dyn CommandObserver> {
        Some(self)
    }
}

impl CommandObserver for SuicideCommand {
    fn entry(&self) -> &str {
        &self.entry
    }

    fn help(&self) -> String {
        "Kill yourself".to_string()
    }

    fn on_triggered(&self, ctx: &Context, player: &Arc<Player>, _args: &[String]) -> HandlerResult {
        ctx.console.send(format!("/kill {}", player.name()));
        Ok(())
    }
}

/// `teleport-player`: teleport the caller to another online player.
///
/// The target may be given by a unique prefix of its name.
#[derive(Debug)]
pub struct TeleportCommand {
    entry: String,
    aliases: Vec<String>,
}

impl TeleportCommand {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry: "teleport-player".to_string(),
            aliases: vec!["tpp".to_string()],
        }
    }
}

impl Default for TeleportCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `query` against `names`: an exact match, else a unique prefix.
///
/// # Errors
///
/// Returns `InvalidArguments` when nothing matches or the prefix is
/// ambiguous.
pub fn resolve_name<'a>(query: &str, names: &'a [String]) -> Result<&'a str, HandlerError> {
    if let Some(exact) = names.iter().find(|n| *n == query) {
        return Ok(exact.as_str());
    }

    let candidates: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| n.starts_with(query))
        .collect();
    match candidates.as_slice() {
        [single] => Ok(*single),
        [] => Err(HandlerError::invalid_arguments("No matching player found")),
        many => Err(HandlerError::invalid_arguments(format!(
            "Ambiguity on player name: {}?",
            many.join(" (or) ")
        ))),
    }
}

impl Observer for TeleportCommand {
    fn as_command(&self) -> Option<&dyn CommandObserver> {
        Some(self)
    }
}

impl CommandObserver for TeleportCommand {
    fn entry(&self) -> &str {
        &self.entry
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn help(&self) -> String {
        [
            "Teleport yourself to another player".to_string(),
            format!(" - {} Alex : teleport yourself to Alex", self.entry),
            format!(" - {} A : same, Alex is inferred from A", self.entry),
        ]
        .join("\n")
    }

    fn on_triggered(&self, ctx: &Context, player: &Arc<Player>, args: &[String]) -> HandlerResult {
        let [query] = args else {
            return Err(HandlerError::invalid_arguments("expected one player name"));
        };

        let online: Vec<String> = ctx
            .players
            .online()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let target = resolve_name(query, &online)?;

        ctx.console
            .send(format!("/tp {} {target}", player.name()));
        ctx.console
            .say(&format!("Teleported {} to {target}.", player.name()));
        Ok(())
    }
}

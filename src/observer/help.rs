//! Built-in `help` command.

use std::sync::Arc;

use crate::console::Color;
use crate::context::Context;
use crate::event::DEFAULT_COMMAND_PREFIX;
use crate::handler::HandlerResult;
use crate::player::Player;

use super::{CommandObserver, Observer};

/// Lists available commands, or shows help for one of them.
#[derive(Debug, Clone)]
pub struct HelpCommand {
    entry: String,
    aliases: Vec<String>,
    prefix: char,
}

impl HelpCommand {
    #[must_use]
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            aliases: Vec::new(),
            prefix: DEFAULT_COMMAND_PREFIX,
        }
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| (*a).to_string()).collect();
        self
    }

    /// Command prefix shown in usage hints.
    #[must_use]
    pub fn with_prefix(mut self, prefix: char) -> Self {
        self.prefix = prefix;
        self
    }

    fn overview(&self, ctx: &Context) -> String {
        let mut lines = vec!["Available commands:".to_string()];
        for listing in ctx.observers.commands() {
            let mut line = format!(" - {}", listing.first_token());
            let others: Vec<&str> = listing
                .aliases
                .iter()
                .map(String::as_str)
                .filter(|a| *a != listing.first_token())
                .collect();
            if !others.is_empty() {
                line.push_str(&format!(" ({})", others.join(", ")));
            }
            lines.push(line);
        }
        lines.push(format!(
            "To show help for a specific command: {}{} [entry]",
            self.prefix, self.entry
        ));
        lines.join("\n")
    }
}

impl Observer for HelpCommand {
    fn as_command(&self) -> Option<&dyn CommandObserver> {
        Some(self)
    }
}

impl CommandObserver for HelpCommand {
    fn entry(&self) -> &str {
        &self.entry
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn help(&self) -> String {
        format!(
            "Show available commands. Usage: {}{} [entry]",
            self.prefix, self.entry
        )
    }

    fn on_triggered(&self, ctx: &Context, player: &Arc<Player>, args: &[String]) -> HandlerResult {
        let Some(entry) = args.first() else {
            ctx.console.tellraw(player, &self.overview(ctx), Color::White);
            return Ok(());
        };

        let command = ctx.observers.command(entry);
        match command.as_deref().and_then(|ob| ob.as_command()) {
            Some(command) => {
                ctx.console
                    .tellraw(player, &format!("Help for command - {entry}"), Color::Yellow);
                ctx.console.tellraw(player, &command.help(), Color::White);
            }
            None => {
                ctx.console
                    .tellraw(player, &format!("No such command - {entry}"), Color::Red);
            }
        }
        Ok(())
    }
}

/// Observers every server gets.
#[must_use]
pub fn default_observers(prefix: char) -> Vec<Arc<dyn Observer>> {
    vec![Arc::new(HelpCommand::new("help").with_prefix(prefix))]
}

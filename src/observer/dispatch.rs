//! Routing of parsed events to observers.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::console::Color;
use crate::context::Context;
use crate::event::{Event, EventKind};
use crate::handler::{isolate, HandlerError, HandlerResult};
use crate::player::Player;

use super::{LifecycleObserver, Observer};

/// Counts of handler invocations made for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked.
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// Routes events to the observers registered in a [`Context`].
///
/// Status side effects are sequenced around lifecycle hooks: the player's
/// record is loaded and the session opened before any login hook runs, and
/// the session is closed before the logout hooks and saved after them.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: Context,
}

impl Dispatcher {
    #[must_use]
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Dispatch one event. Handler failures are logged, never propagated.
    pub fn dispatch(&self, event: &Event) -> DispatchReport {
        let mut report = DispatchReport::default();
        match &event.kind {
            EventKind::Login { player } => self.login(&mut report, player, event.timestamp),
            EventKind::Logout { player } => self.logout(&mut report, player, event.timestamp),
            EventKind::Speak { player, message } => {
                self.each_lifecycle(&mut report, "speak", |ob| {
                    ob.on_speak(&self.ctx, player, message)
                });
            }
            EventKind::Cmd {
                player,
                entry,
                args,
            } => self.command(&mut report, player, entry, args),
            EventKind::ListPlayers { .. } | EventKind::General => {}
        }
        report
    }

    fn login(&self, report: &mut DispatchReport, player: &Arc<Player>, at: DateTime<Local>) {
        match self.ctx.store.load(player) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(player = %player.name(), "First visit, no saved status"),
            Err(e) => tracing::warn!(
                player = %player.name(),
                error = %e,
                "Failed to load player status, keeping defaults"
            ),
        }

        if player.status().begin_session(at) {
            tracing::info!(player = %player.name(), "New day, online time today reset");
        }
        tracing::info!(player = %player.name(), "Player logged in");

        self.each_lifecycle(report, "login", |ob| ob.on_login(&self.ctx, player));
    }

    fn logout(&self, report: &mut DispatchReport, player: &Arc<Player>, at: DateTime<Local>) {
        let elapsed = player.status().end_session(at);
        tracing::info!(
            player = %player.name(),
            session_secs = elapsed,
            "Player logged out"
        );

        self.each_lifecycle(report, "logout", |ob| ob.on_logout(&self.ctx, player));

        if let Err(e) = self.ctx.store.save(player) {
            tracing::warn!(player = %player.name(), error = %e, "Failed to save player status");
        }
    }

    fn command(
        &self,
        report: &mut DispatchReport,
        player: &Arc<Player>,
        entry: &str,
        args: &[String],
    ) {
        let Some(observer) = self.ctx.observers.command(entry) else {
            tracing::debug!(player = %player.name(), entry = %entry, "Unknown command");
            self.ctx.console.tellraw(
                player,
                &format!("Invalid command - {entry}"),
                Color::Red,
            );
            return;
        };
        let Some(command) = observer.as_command() else {
            return;
        };

        report.invoked += 1;
        tracing::debug!(player = %player.name(), entry = %entry, ?args, "Running command");
        match isolate(|| command.on_triggered(&self.ctx, player, args)) {
            Ok(()) => {}
            Err(HandlerError::InvalidArguments(reason)) => {
                tracing::debug!(entry = %entry, reason = %reason, "Invalid command arguments");
                self.ctx.console.tellraw(
                    player,
                    &format!("Invalid arguments - {reason}"),
                    Color::Red,
                );
                self.ctx
                    .console
                    .tellraw(player, &command.help(), Color::White);
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    observer = observer.name(),
                    entry = %entry,
                    error = %e,
                    "Command failed"
                );
            }
        }
    }

    fn each_lifecycle<F>(&self, report: &mut DispatchReport, hook: &'static str, mut call: F)
    where
        F: FnMut(&dyn LifecycleObserver) -> HandlerResult,
    {
        for observer in self.ctx.observers.lifecycle() {
            let Some(lifecycle) = observer.as_lifecycle() else {
                continue;
            };
            report.invoked += 1;
            if let Err(e) = isolate(|| call(lifecycle)) {
                report.failed += 1;
                log_hook_failure(observer.as_ref(), hook, &e);
            }
        }
    }
}

fn log_hook_failure(observer: &dyn Observer, hook: &str, error: &HandlerError) {
    tracing::warn!(
        observer = observer.name(),
        hook,
        error = %error,
        "Lifecycle hook failed"
    );
}

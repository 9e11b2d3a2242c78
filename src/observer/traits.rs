//! Observer capability traits.

use std::sync::Arc;

use crate::context::Context;
use crate::handler::HandlerResult;
use crate::player::Player;

/// Capabilities an observer declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub lifecycle: bool,
    pub command: bool,
    pub periodic: bool,
}

impl Capabilities {
    /// Returns true if no capability is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.lifecycle || self.command || self.periodic)
    }
}

/// A registrable handler.
///
/// Implementors override the `as_*` accessors for each capability they
/// provide; the defaults declare none.
pub trait Observer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn as_lifecycle(&self) -> Option<&dyn LifecycleObserver> {
        None
    }

    fn as_command(&self) -> Option<&dyn CommandObserver> {
        None
    }

    fn as_periodic(&self) -> Option<&dyn PeriodicObserver> {
        None
    }

    /// Declared capabilities, derived from the `as_*` accessors.
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            lifecycle: self.as_lifecycle().is_some(),
            command: self.as_command().is_some(),
            periodic: self.as_periodic().is_some(),
        }
    }
}

/// Reacts to players joining, leaving and chatting.
pub trait LifecycleObserver: Send + Sync {
    fn on_login(&self, _ctx: &Context, _player: &Arc<Player>) -> HandlerResult {
        Ok(())
    }

    fn on_logout(&self, _ctx: &Context, _player: &Arc<Player>) -> HandlerResult {
        Ok(())
    }

    fn on_speak(&self, _ctx: &Context, _player: &Arc<Player>, _message: &str) -> HandlerResult {
        Ok(())
    }
}

/// A named chat command.
pub trait CommandObserver: Send + Sync {
    /// Primary token routing to this command.
    fn entry(&self) -> &str;

    /// Secondary tokens routing to this command.
    fn aliases(&self) -> &[String] {
        &[]
    }

    /// Help text shown by the `help` command.
    fn help(&self) -> String;

    /// Handle an invocation.
    ///
    /// # Errors
    ///
    /// Return `HandlerError::InvalidArguments` to have the player shown the
    /// reason together with this command's help.
    fn on_triggered(&self, ctx: &Context, player: &Arc<Player>, args: &[String]) -> HandlerResult;
}

/// Called once per tick of the periodic loop.
pub trait PeriodicObserver: Send + Sync {
    fn tick(&self, ctx: &Context) -> HandlerResult;
}

/// Pointer identity for observers behind `Arc<dyn Observer>`.
#[must_use]
pub fn same_observer(a: &Arc<dyn Observer>, b: &Arc<dyn Observer>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

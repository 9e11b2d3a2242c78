//! Shared handles passed to every handler.

use crate::console::Console;
use crate::observer::ObserverRegistry;
use crate::player::{PlayerTable, StatusStore};
use crate::scheduler::Scheduler;

/// Everything a handler may need, constructed once per server run.
///
/// Cloning is cheap; every field is a shared handle.
#[derive(Debug, Clone)]
pub struct Context {
    pub console: Console,
    pub scheduler: Scheduler,
    pub players: PlayerTable,
    pub store: StatusStore,
    pub observers: ObserverRegistry,
}

impl Context {
    /// Create a context with an empty player table and observer registry.
    #[must_use]
    pub fn new(console: Console, scheduler: Scheduler, store: StatusStore) -> Self {
        Self {
            console,
            scheduler,
            players: PlayerTable::new(),
            store,
            observers: ObserverRegistry::new(),
        }
    }
}

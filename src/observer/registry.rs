//! Observer registration and lookup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{same_observer, Capabilities, Observer};

/// A routed command, as listed by `help`.
#[derive(Clone)]
pub struct CommandListing {
    /// Primary entry, if it still routes to this observer.
    pub entry: Option<String>,
    /// Aliases that still route to this observer.
    pub aliases: Vec<String>,
    pub observer: Arc<dyn Observer>,
}

#[derive(Default)]
struct Inner {
    lifecycle: Vec<Arc<dyn Observer>>,
    commands: HashMap<String, Arc<dyn Observer>>,
    command_order: Vec<Arc<dyn Observer>>,
    periodic: Vec<Arc<dyn Observer>>,
}

/// Registry of observers, shared by the dispatcher and the periodic loop.
///
/// Readers take snapshots, so handlers may consult the registry (or register
/// more observers) while being dispatched.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("RwLock poisoned");
        f.debug_struct("ObserverRegistry")
            .field("lifecycle", &inner.lifecycle.len())
            .field("commands", &inner.commands.len())
            .field("periodic", &inner.periodic.len())
            .finish()
    }
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer under every capability it declares.
    ///
    /// Lifecycle observers are dispatched in registration order. For command
    /// tokens the last registration wins.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn register(&self, observer: Arc<dyn Observer>) -> Capabilities {
        let caps = observer.capabilities();
        if caps.is_empty() {
            tracing::warn!(observer = observer.name(), "Observer declares no capabilities");
            return caps;
        }

        let mut inner = self.inner.write().expect("RwLock poisoned");

        if caps.lifecycle {
            inner.lifecycle.push(Arc::clone(&observer));
        }

        if let Some(command) = observer.as_command() {
            let tokens = std::iter::once(command.entry().to_string())
                .chain(command.aliases().iter().cloned());
            for token in tokens {
                if let Some(previous) = inner.commands.insert(token.clone(), Arc::clone(&observer)) {
                    if !same_observer(&previous, &observer) {
                        tracing::debug!(
                            command = %token,
                            previous = previous.name(),
                            observer = observer.name(),
                            "Command token reassigned"
                        );
                    }
                }
            }
            inner.command_order.push(Arc::clone(&observer));
        }

        if caps.periodic {
            inner.periodic.push(Arc::clone(&observer));
        }

        tracing::debug!(
            observer = observer.name(),
            lifecycle = caps.lifecycle,
            command = caps.command,
            periodic = caps.periodic,
            "Observer registered"
        );
        caps
    }

    /// Register several observers in order.
    pub fn register_all<I>(&self, observers: I)
    where
        I: IntoIterator<Item = Arc<dyn Observer>>,
    {
        for observer in observers {
            self.register(observer);
        }
    }

    /// Lifecycle observers in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn lifecycle(&self) -> Vec<Arc<dyn Observer>> {
        self.inner.read().expect("RwLock poisoned").lifecycle.clone()
    }

    /// Periodic observers in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn periodic(&self) -> Vec<Arc<dyn Observer>> {
        self.inner.read().expect("RwLock poisoned").periodic.clone()
    }

    /// Observer routed to by a command token.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn command(&self, token: &str) -> Option<Arc<dyn Observer>> {
        self.inner
            .read()
            .expect("RwLock poisoned")
            .commands
            .get(token)
            .cloned()
    }

    /// Every command observer that still owns at least one token, sorted by
    /// its first routed token.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn commands(&self) -> Vec<CommandListing> {
        let inner = self.inner.read().expect("RwLock poisoned");
        let routes_to = |token: &str, observer: &Arc<dyn Observer>| {
            inner
                .commands
                .get(token)
                .is_some_and(|routed| same_observer(routed, observer))
        };

        let mut listings: Vec<CommandListing> = Vec::new();
        for observer in &inner.command_order {
            if listings.iter().any(|l| same_observer(&l.observer, observer)) {
                continue;
            }
            let Some(command) = observer.as_command() else {
                continue;
            };
            let entry = Some(command.entry().to_string()).filter(|e| routes_to(e, observer));
            let aliases: Vec<String> = command
                .aliases()
                .iter()
                .filter(|a| routes_to(a, observer))
                .cloned()
                .collect();
            if entry.is_none() && aliases.is_empty() {
                continue;
            }
            listings.push(CommandListing {
                entry,
                aliases,
                observer: Arc::clone(observer),
            });
        }

        listings.sort_by(|a, b| a.first_token().cmp(b.first_token()));
        listings
    }
}

impl CommandListing {
    /// The entry, or the first alias when the entry was reassigned.
    #[must_use]
    pub fn first_token(&self) -> &str {
        self.entry
            .as_deref()
            .or_else(|| self.aliases.first().map(String::as_str))
            .unwrap_or_default()
    }
}

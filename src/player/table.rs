//! Player identities and the process-wide name table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use super::{keys, StatusBag};

/// A named participant on the server.
///
/// Created on first login and kept for the life of the process.
#[derive(Debug)]
pub struct Player {
    name: String,
    status: StatusBag,
}

impl Player {
    /// Create a player with a fresh status bag, offline.
    #[must_use]
    pub fn new(name: impl Into<String>, now: DateTime<Local>) -> Self {
        Self {
            name: name.into(),
            status: StatusBag::new(now),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> &StatusBag {
        &self.status
    }
}

impl Serialize for Player {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Shared name → player table.
///
/// Entries are never removed; logout only updates the player's status.
#[derive(Debug, Clone, Default)]
pub struct PlayerTable {
    players: Arc<RwLock<HashMap<String, Arc<Player>>>>,
}

impl PlayerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a player by name.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Player>> {
        self.players
            .read()
            .expect("RwLock poisoned")
            .get(name)
            .cloned()
    }

    /// Return the player for `name`, creating it online if this is the first
    /// time the name is seen.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn get_or_create(&self, name: &str, now: DateTime<Local>) -> Arc<Player> {
        let mut players = self.players.write().expect("RwLock poisoned");
        Arc::clone(players.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(player = %name, "New player");
            let player = Player::new(name, now);
            player.status().set(keys::IS_ONLINE, true);
            Arc::new(player)
        }))
    }

    /// All players, sorted by name.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Player>> {
        let mut all: Vec<_> = self
            .players
            .read()
            .expect("RwLock poisoned")
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Players currently online, sorted by name.
    #[must_use]
    pub fn online(&self) -> Vec<Arc<Player>> {
        self.all()
            .into_iter()
            .filter(|p| p.status().is_online())
            .collect()
    }

    /// Number of known players.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.read().expect("RwLock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

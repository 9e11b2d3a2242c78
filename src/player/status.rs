//! Per-player status bag.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Well-known status keys present in every bag.
pub mod keys {
    /// Whether the player is currently online.
    pub const IS_ONLINE: &str = "is_online";
    /// Unix seconds of the latest login.
    pub const TIME_LOGIN: &str = "time_login";
    /// Cumulative online seconds over closed sessions.
    pub const TIME_ONLINE: &str = "time_online";
    /// Online seconds today over closed sessions.
    pub const TIME_ONLINE_TODAY: &str = "time_online_today";
}

/// A status value. Only numbers and booleans are stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl StatusValue {
    /// Returns the boolean value, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as `f64` for numeric variants.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(_) => None,
        }
    }
}

impl From<bool> for StatusValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for StatusValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for StatusValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for StatusValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A value together with its persistence tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusEntry {
    pub value: StatusValue,
    pub persistent: bool,
}

/// Online durations in seconds, including the ongoing session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OnlineTime {
    /// Current session, zero when offline.
    pub session: f64,
    /// Today, including the current session.
    pub today: f64,
    /// All time, including the current session.
    pub total: f64,
}

/// Convert a `DateTime` to fractional unix seconds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_unix_secs<Tz: TimeZone>(at: &DateTime<Tz>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// Convert fractional unix seconds to local time.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn from_unix_secs(secs: f64) -> Option<DateTime<Local>> {
    let millis = (secs * 1000.0).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Local))
}

/// Mutable key-value status owned by one player.
///
/// All operations take the bag's own lock, so the dispatch path and periodic
/// callbacks may touch the same bag concurrently. Bags of different players
/// share nothing.
#[derive(Debug)]
pub struct StatusBag {
    entries: RwLock<HashMap<String, StatusEntry>>,
}

impl StatusBag {
    /// Create a bag holding the minimal key set, offline, logged in at `now`.
    #[must_use]
    pub fn new(now: DateTime<Local>) -> Self {
        let mut entries = HashMap::new();
        let mut put = |key: &str, value: StatusValue, persistent: bool| {
            entries.insert(key.to_string(), StatusEntry { value, persistent });
        };
        put(keys::IS_ONLINE, StatusValue::Bool(false), false);
        put(keys::TIME_LOGIN, StatusValue::Float(to_unix_secs(&now)), true);
        put(keys::TIME_ONLINE, StatusValue::Float(0.0), true);
        put(keys::TIME_ONLINE_TODAY, StatusValue::Float(0.0), true);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Get a value.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<StatusValue> {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .get(key)
            .map(|e| e.value)
    }

    /// Get a value with its persistence tag.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<StatusEntry> {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .get(key)
            .copied()
    }

    /// Check whether a key exists.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .contains_key(key)
    }

    /// Insert `value` only if `key` is absent, returning the value now stored.
    ///
    /// The persistence tag is applied only when the key is inserted.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn setdefault(
        &self,
        key: &str,
        value: impl Into<StatusValue>,
        persistent: bool,
    ) -> StatusValue {
        let mut entries = self.entries.write().expect("RwLock poisoned");
        entries
            .entry(key.to_string())
            .or_insert(StatusEntry {
                value: value.into(),
                persistent,
            })
            .value
    }

    /// Set a value, keeping the key's existing tag. New keys are transient.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn set(&self, key: &str, value: impl Into<StatusValue>) {
        let value = value.into();
        let mut entries = self.entries.write().expect("RwLock poisoned");
        entries
            .entry(key.to_string())
            .and_modify(|e| e.value = value)
            .or_insert(StatusEntry {
                value,
                persistent: false,
            });
    }

    /// Set a value and its persistence tag.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn set_tagged(&self, key: &str, value: impl Into<StatusValue>, persistent: bool) {
        self.entries.write().expect("RwLock poisoned").insert(
            key.to_string(),
            StatusEntry {
                value: value.into(),
                persistent,
            },
        );
    }

    /// Change the persistence tag of an existing key.
    ///
    /// Returns `false` if the key does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn mark_persistent(&self, key: &str, persistent: bool) -> bool {
        let mut entries = self.entries.write().expect("RwLock poisoned");
        match entries.get_mut(key) {
            Some(entry) => {
                entry.persistent = persistent;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the persistent subset.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn persistent_values(&self) -> BTreeMap<String, StatusValue> {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .iter()
            .filter(|(_, e)| e.persistent)
            .map(|(k, e)| (k.clone(), e.value))
            .collect()
    }

    /// Restore persisted values, tagging each as persistent.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn restore(&self, values: BTreeMap<String, StatusValue>) {
        let mut entries = self.entries.write().expect("RwLock poisoned");
        for (key, value) in values {
            entries.insert(
                key,
                StatusEntry {
                    value,
                    persistent: true,
                },
            );
        }
    }

    /// Whether the player is online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.get(keys::IS_ONLINE)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Unix seconds of the latest login.
    #[must_use]
    pub fn time_login(&self) -> f64 {
        self.number(keys::TIME_LOGIN)
    }

    /// Cumulative online seconds over closed sessions.
    #[must_use]
    pub fn time_online(&self) -> f64 {
        self.number(keys::TIME_ONLINE)
    }

    /// Online seconds today over closed sessions.
    #[must_use]
    pub fn time_online_today(&self) -> f64 {
        self.number(keys::TIME_ONLINE_TODAY)
    }

    fn number(&self, key: &str) -> f64 {
        self.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
    }

    /// Open a session at `now`.
    ///
    /// Resets the today counter when `now` falls on a different local calendar
    /// date than the previous login, then records the login time and marks
    /// the player online. Returns whether the today counter was reset.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn begin_session(&self, now: DateTime<Local>) -> bool {
        let mut entries = self.entries.write().expect("RwLock poisoned");

        let previous = entries
            .get(keys::TIME_LOGIN)
            .and_then(|e| e.value.as_f64())
            .and_then(from_unix_secs);
        let rolled_over = previous.is_some_and(|prev| prev.date_naive() != now.date_naive());
        if rolled_over {
            set_locked(&mut entries, keys::TIME_ONLINE_TODAY, StatusValue::Float(0.0));
        }

        set_locked(
            &mut entries,
            keys::TIME_LOGIN,
            StatusValue::Float(to_unix_secs(&now)),
        );
        set_locked(&mut entries, keys::IS_ONLINE, StatusValue::Bool(true));
        rolled_over
    }

    /// Close the session at `now`, returning its length in seconds.
    ///
    /// The length is added to both the total and the today counters.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn end_session(&self, now: DateTime<Local>) -> f64 {
        let mut entries = self.entries.write().expect("RwLock poisoned");

        let login = entries
            .get(keys::TIME_LOGIN)
            .and_then(|e| e.value.as_f64())
            .unwrap_or_else(|| to_unix_secs(&now));
        let elapsed = (to_unix_secs(&now) - login).max(0.0);

        set_locked(&mut entries, keys::IS_ONLINE, StatusValue::Bool(false));
        add_locked(&mut entries, keys::TIME_ONLINE, elapsed);
        add_locked(&mut entries, keys::TIME_ONLINE_TODAY, elapsed);
        elapsed
    }

    /// Online durations as of `now`.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn online_time(&self, now: DateTime<Local>) -> OnlineTime {
        let entries = self.entries.read().expect("RwLock poisoned");
        let number = |key: &str| {
            entries
                .get(key)
                .and_then(|e| e.value.as_f64())
                .unwrap_or(0.0)
        };
        let online = entries
            .get(keys::IS_ONLINE)
            .and_then(|e| e.value.as_bool())
            .unwrap_or(false);

        let session = if online {
            (to_unix_secs(&now) - number(keys::TIME_LOGIN)).max(0.0)
        } else {
            0.0
        };
        OnlineTime {
            session,
            today: number(keys::TIME_ONLINE_TODAY) + session,
            total: number(keys::TIME_ONLINE) + session,
        }
    }
}

fn set_locked(entries: &mut HashMap<String, StatusEntry>, key: &str, value: StatusValue) {
    entries
        .entry(key.to_string())
        .and_modify(|e| e.value = value)
        .or_insert(StatusEntry {
            value,
            persistent: false,
        });
}

fn add_locked(entries: &mut HashMap<String, StatusEntry>, key: &str, delta: f64) -> f64 {
    let entry = entries.entry(key.to_string()).or_insert(StatusEntry {
        value: StatusValue::Float(0.0),
        persistent: false,
    });
    let updated = entry.value.as_f64().unwrap_or(0.0) + delta;
    entry.value = StatusValue::Float(updated);
    updated
}

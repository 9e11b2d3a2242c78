//! Event types produced from server console lines.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::player::Player;

/// Kind-specific payload of an [`Event`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Any line that is not recognised.
    General,
    /// A player joined the game.
    Login { player: Arc<Player> },
    /// A player left the game.
    Logout { player: Arc<Player> },
    /// A player said something in chat.
    Speak {
        player: Arc<Player>,
        message: String,
    },
    /// A player issued a prefixed chat command.
    Cmd {
        player: Arc<Player>,
        entry: String,
        args: Vec<String>,
    },
    /// Reply to the `list` command.
    ListPlayers { players: Vec<Arc<Player>> },
}

/// One parsed console line.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Wall-clock time the line was parsed.
    pub timestamp: DateTime<Local>,
    /// The line as read, without the trailing newline.
    pub raw_line: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Create a general event for a raw line.
    #[must_use]
    pub fn general(raw_line: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            raw_line: raw_line.into(),
            kind: EventKind::General,
        }
    }

    /// Short lowercase name of the event kind.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EventKind::General => "general",
            EventKind::Login { .. } => "login",
            EventKind::Logout { .. } => "logout",
            EventKind::Speak { .. } => "speak",
            EventKind::Cmd { .. } => "cmd",
            EventKind::ListPlayers { .. } => "list_players",
        }
    }

    /// The player this event is about, if any.
    #[must_use]
    pub fn player(&self) -> Option<&Arc<Player>> {
        match &self.kind {
            EventKind::Login { player }
            | EventKind::Logout { player }
            | EventKind::Speak { player, .. }
            | EventKind::Cmd { player, .. } => Some(player),
            EventKind::General | EventKind::ListPlayers { .. } => None,
        }
    }

    /// Returns true if this is a general (unrecognised) event.
    #[must_use]
    pub fn is_general(&self) -> bool {
        matches!(self.kind, EventKind::General)
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::General, Self::General) => true,
            (Self::Login { player: a }, Self::Login { player: b })
            | (Self::Logout { player: a }, Self::Logout { player: b }) => Arc::ptr_eq(a, b),
            (
                Self::Speak {
                    player: a,
                    message: ma,
                },
                Self::Speak {
                    player: b,
                    message: mb,
                },
            ) => Arc::ptr_eq(a, b) && ma == mb,
            (
                Self::Cmd {
                    player: a,
                    entry: ea,
                    args: aa,
                },
                Self::Cmd {
                    player: b,
                    entry: eb,
                    args: ab,
                },
            ) => Arc::ptr_eq(a, b) && ea == eb && aa == ab,
            (Self::ListPlayers { players: a }, Self::ListPlayers { players: b }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
            }
            _ => false,
        }
    }
}

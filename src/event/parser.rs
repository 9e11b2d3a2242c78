//! Line parser turning server console output into [`Event`]s.
//!
//! Server log lines look like `[12:00:00] [Server thread/INFO]: <message>`.
//! Anything that does not have that shape becomes a general event.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Local};
use regex::Regex;

use crate::event::{Event, EventKind};
use crate::player::{Player, PlayerTable};

/// Default prefix marking a chat message as a command.
pub const DEFAULT_COMMAND_PREFIX: char = '\\';

const JOINED_MARKER: &str = "joined the game";
const LEFT_MARKER: &str = "left the game";

static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]]*\]").expect("bracket regex is valid"));

static LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^There are \d+ of a max of \d+ players online:(.*)$").expect("list regex is valid")
});

static CHAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([^<>]*)>(.*)$").expect("chat regex is valid"));

/// Parses console lines against the shared player table.
///
/// Parsing never fails. The only side effect is creating a player the first
/// time their login line is seen.
#[derive(Debug, Clone)]
pub struct EventParser {
    players: PlayerTable,
    command_prefix: char,
}

impl EventParser {
    #[must_use]
    pub fn new(players: PlayerTable) -> Self {
        Self {
            players,
            command_prefix: DEFAULT_COMMAND_PREFIX,
        }
    }

    /// Use a different command prefix character.
    #[must_use]
    pub fn with_command_prefix(mut self, prefix: char) -> Self {
        self.command_prefix = prefix;
        self
    }

    #[must_use]
    pub fn command_prefix(&self) -> char {
        self.command_prefix
    }

    /// Parse a line, stamping it with the current time.
    #[must_use]
    pub fn parse(&self, line: &str) -> Event {
        self.parse_at(line, Local::now())
    }

    /// Parse a line with an explicit timestamp.
    #[must_use]
    pub fn parse_at(&self, line: &str, timestamp: DateTime<Local>) -> Event {
        let line = line.trim_end_matches(['\r', '\n']);
        let kind = self.parse_kind(line, timestamp);
        Event {
            timestamp,
            raw_line: line.to_string(),
            kind,
        }
    }

    fn parse_kind(&self, line: &str, timestamp: DateTime<Local>) -> EventKind {
        let Some(content) = message_content(line) else {
            return EventKind::General;
        };

        if let Some((name, _)) = content.split_once(JOINED_MARKER) {
            let player = self.players.get_or_create(name.trim(), timestamp);
            return EventKind::Login { player };
        }

        if let Some((name, _)) = content.split_once(LEFT_MARKER) {
            return match self.known_player(name.trim(), "logout") {
                Some(player) => EventKind::Logout { player },
                None => EventKind::General,
            };
        }

        if let Some(caps) = LIST_RE.captures(&content) {
            let players = caps[1]
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .filter_map(|name| {
                    let player = self.players.get(name);
                    if player.is_none() {
                        tracing::debug!(player = %name, "Unknown player in list reply");
                    }
                    player
                })
                .collect();
            return EventKind::ListPlayers { players };
        }

        if let Some(caps) = CHAT_RE.captures(&content) {
            let name = &caps[1];
            let rest = caps[2].strip_prefix(' ').unwrap_or(&caps[2]);
            let Some(player) = self.known_player(name, "chat") else {
                return EventKind::General;
            };
            return match rest.strip_prefix(self.command_prefix) {
                Some(command) => {
                    let mut tokens = command.split_whitespace().map(str::to_string);
                    let entry = tokens.next().unwrap_or_default();
                    EventKind::Cmd {
                        player,
                        entry,
                        args: tokens.collect(),
                    }
                }
                None => EventKind::Speak {
                    player,
                    message: rest.to_string(),
                },
            };
        }

        EventKind::General
    }

    fn known_player(&self, name: &str, context: &str) -> Option<Arc<Player>> {
        let player = self.players.get(name);
        if player.is_none() {
            tracing::warn!(
                player = %name,
                context,
                "Dropping event for player never seen logging in"
            );
        }
        player
    }
}

/// Split a line into bracketed segments and the text between them.
#[must_use]
pub fn split_brackets(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut idx = 0;
    for m in BRACKET_RE.find_iter(line) {
        if m.start() > idx {
            segments.push(&line[idx..m.start()]);
        }
        segments.push(m.as_str());
        idx = m.end();
    }
    if segments.is_empty() {
        return segments;
    }
    if idx < line.len() {
        segments.push(&line[idx..]);
    }
    segments
}

/// Extract the message part of a `[time] [thread/level]: message` line.
fn message_content(line: &str) -> Option<String> {
    let segments = split_brackets(line);
    if segments.len() < 4
        || !segments[0].starts_with('[')
        || !segments[2].starts_with('[')
        || !segments[3].starts_with(": ")
    {
        return None;
    }

    let mut content = segments[3][2..].to_string();
    for segment in &segments[4..] {
        content.push_str(segment);
    }
    Some(content)
}

//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::DEFAULT_COMMAND_PREFIX;

/// Directory, inside the world directory, holding controller state.
pub const STATE_DIR_NAME: &str = ".mcservercontrol";

/// Configuration for the online-time reminder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,
    /// Seconds online today before the first warning.
    pub tolerance_secs: u64,
    /// Minimum seconds between two warnings.
    pub interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance_secs: 3600,
            interval_secs: 1200,
        }
    }
}

/// Which preset observers to register.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AddonsConfig {
    pub welcome: bool,
    pub goodbye: bool,
    pub suicide: bool,
    pub online_time: bool,
    pub kill_item: bool,
    pub teleport: bool,
    pub reminder: ReminderConfig,
}

impl Default for AddonsConfig {
    fn default() -> Self {
        Self {
            welcome: true,
            goodbye: true,
            suicide: true,
            online_time: true,
            kill_item: true,
            teleport: true,
            reminder: ReminderConfig::default(),
        }
    }
}

/// Configuration for the server controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory the server runs in.
    pub server_dir: PathBuf,
    /// Command line starting the server, split on whitespace.
    pub entry: String,
    /// World directory name inside `server_dir`.
    pub world_name: String,
    /// Where player status records live. Defaults to
    /// `<server_dir>/<world_name>/.mcservercontrol`.
    pub status_dir: Option<PathBuf>,
    /// Character starting a chat command.
    pub command_prefix: char,
    /// Seconds between periodic ticks.
    pub periodic_interval_secs: f64,
    /// Console command asking the server to stop.
    pub stop_command: String,
    /// Seconds to wait after the stop command before terminating.
    pub stop_timeout_secs: u64,
    /// Echo server output to the terminal.
    pub echo: bool,
    pub addons: AddonsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_dir: PathBuf::from("."),
            entry: "java -Xmx1024M -Xms1024M -jar server.jar nogui".to_string(),
            world_name: "world".to_string(),
            status_dir: None,
            command_prefix: DEFAULT_COMMAND_PREFIX,
            periodic_interval_secs: 1.0,
            stop_command: "stop".to_string(),
            stop_timeout_secs: 30,
            echo: true,
            addons: AddonsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// The world directory.
    #[must_use]
    pub fn world_dir(&self) -> PathBuf {
        self.server_dir.join(&self.world_name)
    }

    /// Resolved directory for player status records.
    #[must_use]
    pub fn status_dir(&self) -> PathBuf {
        match &self.status_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.server_dir.join(dir),
            None => self.world_dir().join(STATE_DIR_NAME),
        }
    }

    /// Periodic interval, clamped between 10 ms and one day.
    #[must_use]
    pub fn periodic_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.periodic_interval_secs.clamp(0.01, 86_400.0))
            .unwrap_or(Duration::from_secs(1))
    }

    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

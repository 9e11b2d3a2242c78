//! Disk persistence for player status.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::{Player, StatusValue};

/// Errors that can occur while loading or saving status records.
#[derive(thiserror::Error, Debug)]
pub enum StatusError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stores the persistent part of each player's status bag as one JSON file.
///
/// Files are named by the hex SHA-256 of the player name, so raw names never
/// reach the filesystem.
#[derive(Debug, Clone)]
pub struct StatusStore {
    dir: PathBuf,
}

impl StatusStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the records.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record path for a player name.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(name.as_bytes()));
        self.dir.join(format!("{digest}.json"))
    }

    /// Restore persisted keys into the player's bag.
    ///
    /// Returns `false` when no record exists, leaving the defaults untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a record exists but cannot be read or parsed.
    pub fn load(&self, player: &Player) -> Result<bool, StatusError> {
        let path = self.path_for(player.name());
        if !path.exists() {
            tracing::debug!(player = %player.name(), "No status record, keeping defaults");
            return Ok(false);
        }

        let content = fs::read_to_string(&path)?;
        let values: BTreeMap<String, StatusValue> = serde_json::from_str(&content)?;
        tracing::debug!(
            player = %player.name(),
            keys = values.len(),
            "Loaded status record"
        );
        player.status().restore(values);
        Ok(true)
    }

    /// Write the persistent keys of the player's bag, replacing any prior record.
    ///
    /// Writes to a temporary file first, then renames to avoid corruption.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn save(&self, player: &Player) -> Result<(), StatusError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(player.name());
        let temp_path = path.with_extension("tmp");
        let values = player.status().persistent_values();
        let content = serde_json::to_string_pretty(&values)?;
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!(
            player = %player.name(),
            keys = values.len(),
            "Saved status record"
        );
        Ok(())
    }
}

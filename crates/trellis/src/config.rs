//! Board configuration.
//!
//! Hosts keep a small YAML file under a `.trellis/` directory at the board
//! root; trellis reads the initiative ID prefix from it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the board directory
pub const BOARD_DIR_NAME: &str = ".trellis";

/// Name of the configuration file inside the board directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Board configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Initiative ID prefix (e.g., "plan" for "plan-a3f8")
    #[serde(rename = "initiative-prefix")]
    pub initiative_prefix: String,
}

impl BoardConfig {
    /// Create a new configuration with the given prefix
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            initiative_prefix: prefix.to_string(),
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Config`] when it is not valid YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when serialization fails and
    /// [`Error::Io`] when the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {}", e)))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new("plan")
    }
}

/// Search up the directory tree for a directory containing `.trellis/`.
///
/// Returns the first ancestor (including `start` itself) that contains a
/// board directory, or `None` when the walk reaches the filesystem root.
#[must_use]
pub fn find_board_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(BOARD_DIR_NAME).exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_has_prefix() {
        let config = BoardConfig::default();
        assert_eq!(config.initiative_prefix, "plan");
    }

    #[tokio::test]
    async fn config_round_trips_through_yaml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let original = BoardConfig::new("growth");
        original.save(&config_path).await.unwrap();

        let loaded = BoardConfig::load(&config_path).await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn load_rejects_invalid_yaml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&config_path, ":\n  - not yaml: [")
            .await
            .unwrap();

        let err = BoardConfig::load(&config_path).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn find_board_root_walks_up() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(BOARD_DIR_NAME)).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_board_root(&nested).unwrap();
        assert_eq!(root, dir.path());
    }
}

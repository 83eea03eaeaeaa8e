use crate::error::{PaletteError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_STORAGE_KEY: &str = "caseos-recent-commands";
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

/// What to do when two commands share an id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    KeepBoth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub recent_capacity: usize,
    pub storage_key: String,
    pub duplicate_policy: DuplicatePolicy,
    /// Seeded into the recency list when storage has nothing yet.
    pub default_recent: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            default_recent: Vec::new(),
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    home::home_dir().map(|mut path| {
        path.push(".config");
        path.push("caseos");
        path
    })
}

pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("palette.toml"))
}

impl PaletteConfig {
    /// Loads the user config, falling back to defaults when the file is
    /// missing or broken.
    pub fn load() -> Self {
        let Some(path) = get_config_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "ignoring palette config");
                Self::default()
            }
        }
    }

    /// A missing file is the default config; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let config: Self = toml::from_str(&content).map_err(|source| PaletteError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.recent_capacity = self.recent_capacity.max(1);
        self
    }
}

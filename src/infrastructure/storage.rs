use crate::app::config::get_config_dir;
use crate::domain::ports::KeyValueStore;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Stores each key as `<dir>/<key>.json`. Clones share one write lock, so
/// writes land in the order they were started.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::default(),
        }
    }

    /// `~/.config/caseos`, if a home directory exists.
    pub fn default_location() -> Option<Self> {
        get_config_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !name.starts_with('.');
        if !valid {
            return Err(anyhow!("invalid storage key: {name:?}"));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn read_key(&self, name: &str) -> Result<Option<String>> {
        let path = self.path_for(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn write_key(&self, name: &str, value: &str) -> Result<()> {
        let path = self.path_for(name)?;
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;

        // Write then rename so readers never see a half-written file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

/// In-process store, mostly for tests and hosts without a disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(self, name: &str, value: &str) -> Self {
        self.entries.lock().insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.lock().get(name).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read_key(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name))
    }

    async fn write_key(&self, name: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(name.to_string(), value.to_string());
        Ok(())
    }
}

use super::registry::CommandRegistry;
use crate::domain::command::Command;
use crate::domain::ports::KeyValueStore;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Most-recent-first command ids with no duplicates, never longer than its
/// capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyList {
    ids: Vec<String>,
    capacity: usize,
}

impl RecencyList {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Builds a list from stored ids, dropping repeats and overflow.
    pub fn from_ids<I>(ids: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut list = Self::new(capacity);
        for id in ids {
            if list.ids.len() == list.capacity {
                break;
            }
            if !list.ids.contains(&id) {
                list.ids.push(id);
            }
        }
        list
    }

    /// Moves `id` to the front and returns the new list.
    pub fn record(&mut self, id: &str) -> &[String] {
        if let Some(pos) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(pos);
        }
        self.ids.insert(0, id.to_string());
        self.ids.truncate(self.capacity);
        &self.ids
    }

    /// Resolves ids against the registry, skipping any that no longer exist.
    pub fn materialize<'a>(&self, registry: &'a CommandRegistry) -> Vec<&'a Command> {
        self.ids.iter().filter_map(|id| registry.get(id)).collect()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Best-effort persistence of the recency list under one storage key.
#[derive(Clone)]
pub struct RecencyStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl RecencyStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persisted ids, or `None` if nothing usable is stored. Never fails.
    pub async fn load(&self) -> Option<Vec<String>> {
        let raw = match self.store.read_key(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read recent commands");
                return None;
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Some(ids),
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to parse recent commands");
                None
            }
        }
    }

    /// Writes `ids`; failures are logged and swallowed.
    pub async fn save(&self, ids: &[String]) {
        let value = match serde_json::to_string(ids) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to encode recent commands");
                return;
            }
        };
        if let Err(err) = self.store.write_key(&self.key, &value).await {
            warn!(key = %self.key, error = %err, "failed to save recent commands");
        }
    }

    /// Fire-and-forget [`save`](Self::save) on the current tokio runtime.
    ///
    /// Returns `None` (and skips the write) when called outside a runtime.
    pub fn spawn_save(&self, ids: Vec<String>) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            warn!("no async runtime; recent commands not persisted");
            return None;
        };
        let store = self.clone();
        debug!(count = ids.len(), "persisting recent commands");
        Some(handle.spawn(async move { store.save(&ids).await }))
    }
}

impl std::fmt::Debug for RecencyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecencyStore").field("key", &self.key).finish()
    }
}

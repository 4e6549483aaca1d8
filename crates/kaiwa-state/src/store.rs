// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic persisted mappings backing the runtime state stores.
//!
//! A [`PersistedMap`] is a `u64` identity to value mapping stored as one
//! JSON object; the wire format is textual, so keys are stored as strings
//! and coerced back to integers on load. A [`PersistedSet`] is a set of
//! ids stored as a JSON array. Both are constructed by loading, so a save
//! can never precede the load for its store, and each guards its entries
//! with its own mutex: a save holds the mutex across the whole write, so
//! no caller of the same API observes a partial file.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use kaiwa_core::KaiwaError;

/// A persisted `identity -> value` mapping.
pub struct PersistedMap<V> {
    name: String,
    path: PathBuf,
    entries: Mutex<HashMap<u64, V>>,
}

impl<V> PersistedMap<V>
where
    V: Serialize + DeserializeOwned + Clone + Send,
{
    /// Load the named store from `dir`, or start from `default` when no
    /// file exists. `default` is the live initial state, not a template.
    ///
    /// JSON object keys are coerced to integer identities; a non-integer
    /// key fails with a `Format` error.
    pub async fn load(
        dir: &Path,
        name: &str,
        default: HashMap<u64, V>,
    ) -> Result<Self, KaiwaError> {
        let path = dir.join(format!("{name}.json"));
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                KaiwaError::Format(format!("state store {name}: {e}"))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => default,
            Err(e) => return Err(KaiwaError::storage(e)),
        };
        debug!(name, entries = entries.len(), "state store loaded");
        Ok(Self {
            name: name.to_string(),
            path,
            entries: Mutex::new(entries),
        })
    }

    pub async fn get(&self, id: u64) -> Option<V> {
        self.entries.lock().await.get(&id).cloned()
    }

    pub async fn set(&self, id: u64, value: V) {
        self.entries.lock().await.insert(id, value);
    }

    pub async fn remove(&self, id: u64) -> Option<V> {
        self.entries.lock().await.remove(&id)
    }

    /// Serialize the whole store and overwrite its file.
    pub async fn save(&self) -> Result<(), KaiwaError> {
        let entries = self.entries.lock().await;
        let json = serde_json::to_vec_pretty(&*entries).map_err(KaiwaError::storage)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(KaiwaError::storage)?;
        debug!(name = %self.name, entries = entries.len(), "state store flushed");
        Ok(())
    }
}

/// A persisted set of integer ids (the enabled-channel set).
pub struct PersistedSet {
    name: String,
    path: PathBuf,
    entries: Mutex<HashSet<u64>>,
}

impl PersistedSet {
    pub async fn load(dir: &Path, name: &str) -> Result<Self, KaiwaError> {
        let path = dir.join(format!("{name}.json"));
        let entries: HashSet<u64> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<u64>>(&bytes)
                .map(HashSet::from_iter)
                .map_err(|e| KaiwaError::Format(format!("state store {name}: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(KaiwaError::storage(e)),
        };
        debug!(name, entries = entries.len(), "state store loaded");
        Ok(Self {
            name: name.to_string(),
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Add an id. Idempotent; returns whether it was newly added.
    pub async fn insert(&self, id: u64) -> bool {
        self.entries.lock().await.insert(id)
    }

    /// Remove an id. Removing an absent id is a no-op.
    pub async fn remove(&self, id: u64) -> bool {
        self.entries.lock().await.remove(&id)
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.entries.lock().await.contains(&id)
    }

    /// Serialize the set (stably ordered) and overwrite its file.
    pub async fn save(&self) -> Result<(), KaiwaError> {
        let entries = self.entries.lock().await;
        let mut ids: Vec<u64> = entries.iter().copied().collect();
        ids.sort_unstable();
        let json = serde_json::to_vec_pretty(&ids).map_err(KaiwaError::storage)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(KaiwaError::storage)?;
        debug!(name = %self.name, entries = ids.len(), "state store flushed");
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed conversation history with serialized per-key transactions.
//!
//! One conversation key maps to one JSON file, `{dir}/{key}.json`, holding a
//! pretty-printed array of turns. All read-modify-write access goes through
//! [`HistoryStore::with`], which holds the key's lock for the whole
//! load-mutate-save cycle. Locks live in a process-wide registry, created on
//! first reference and reused for the process lifetime; a fresh lock per
//! call would provide no mutual exclusion at all.
//!
//! Single process, many concurrent callers is the supported model. Durability
//! across multiple processes sharing the same directory is not provided.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use kaiwa_core::{ConversationKey, KaiwaError, Turn};

/// Keyed, crash-safe store of ordered turn sequences.
pub struct HistoryStore {
    dir: PathBuf,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HistoryStore {
    /// A store rooted at `dir`. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// The single reusable lock for a storage name.
    fn lock_for(&self, stem: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks
            .entry(stem.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.json"))
    }

    /// Run one read-modify-write transaction against `key`.
    ///
    /// Acquires the key's lock (blocking until available, no timeout), loads
    /// the persisted sequence, hands it to `f`, and saves it back. The save
    /// runs unconditionally: a mutation that returns an error is persisted
    /// exactly as `f` left it, matching the scope-exit semantics this store
    /// guarantees. `f` must not perform external calls; the lock is held
    /// across the whole cycle.
    pub async fn with<T, F>(&self, key: &ConversationKey, f: F) -> Result<T, KaiwaError>
    where
        F: FnOnce(&mut Vec<Turn>) -> Result<T, KaiwaError>,
    {
        let stem = key.storage_name();
        let lock = self.lock_for(&stem);
        let _guard = lock.lock().await;

        let path = self.path_for(&stem);
        let mut turns = load_lenient(&path).await?;
        let result = f(&mut turns);
        match save(&path, &turns).await {
            Ok(()) => result,
            Err(save_err) => match result {
                // The mutation error is the more specific one to surface.
                Err(e) => {
                    error!(key = %stem, error = %save_err, "save failed after mutation error");
                    Err(e)
                }
                Ok(_) => Err(save_err),
            },
        }
    }

    /// Load the current sequence without mutating anything.
    ///
    /// Takes the key's lock so the read cannot observe a half-written file.
    pub async fn snapshot(&self, key: &ConversationKey) -> Result<Vec<Turn>, KaiwaError> {
        let stem = key.storage_name();
        let lock = self.lock_for(&stem);
        let _guard = lock.lock().await;
        load_lenient(&self.path_for(&stem)).await
    }

    /// Remove the persisted record for `key`.
    ///
    /// Serialized through the same per-key lock as transactions. Fails with
    /// `NotFound` when no record exists.
    pub async fn delete(&self, key: &ConversationKey) -> Result<(), KaiwaError> {
        let stem = key.storage_name();
        let lock = self.lock_for(&stem);
        let _guard = lock.lock().await;

        match tokio::fs::remove_file(self.path_for(&stem)).await {
            Ok(()) => {
                debug!(key = %stem, "history record deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(KaiwaError::NotFound(stem))
            }
            Err(e) => Err(KaiwaError::storage(e)),
        }
    }

    /// Raw stored bytes of the record for `key`, for export.
    pub async fn export(&self, key: &ConversationKey) -> Result<Vec<u8>, KaiwaError> {
        let stem = key.storage_name();
        let lock = self.lock_for(&stem);
        let _guard = lock.lock().await;

        match tokio::fs::read(self.path_for(&stem)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(KaiwaError::NotFound(stem))
            }
            Err(e) => Err(KaiwaError::storage(e)),
        }
    }

    /// Overwrite the record for `key` with an already-validated sequence.
    pub async fn import(&self, key: &ConversationKey, turns: &[Turn]) -> Result<(), KaiwaError> {
        let stem = key.storage_name();
        let lock = self.lock_for(&stem);
        let _guard = lock.lock().await;
        save(&self.path_for(&stem), turns).await
    }

    /// Storage names of all persisted records starting with `prefix`.
    ///
    /// A plain directory listing; no transactional locking.
    pub async fn list_names(&self, prefix: &str) -> Result<Vec<String>, KaiwaError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(KaiwaError::storage)?;
        while let Some(entry) = entries.next_entry().await.map_err(KaiwaError::storage)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem.starts_with(prefix) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Load a record, treating a missing file as first use and an unparsable
/// file as empty. The silent-recovery fallback is logged so a discarded
/// conversation is at least operator-visible.
async fn load_lenient(path: &Path) -> Result<Vec<Turn>, KaiwaError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(KaiwaError::storage(e)),
    };
    match serde_json::from_slice(&bytes) {
        Ok(turns) => Ok(turns),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unparsable history record, loading as empty");
            Ok(Vec::new())
        }
    }
}

/// Whole-file rewrite, pretty-printed, non-ASCII preserved.
async fn save(path: &Path, turns: &[Turn]) -> Result<(), KaiwaError> {
    let json = serde_json::to_vec_pretty(turns).map_err(KaiwaError::storage)?;
    tokio::fs::write(path, json).await.map_err(KaiwaError::storage)
}

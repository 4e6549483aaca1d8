// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The four runtime state stores and their flush scheduling.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use kaiwa_core::KaiwaError;

use crate::store::{PersistedMap, PersistedSet};

/// All persisted runtime state, loaded once at startup.
pub struct StateStores {
    /// Active conversation name per user; `None` means main.
    pub room: PersistedMap<Option<String>>,
    /// Channels the bot responds in.
    pub channel: PersistedSet,
    /// Per-user history window override; `None` means unbounded.
    pub maxhistory: PersistedMap<Option<u64>>,
    /// Per-user model override; `None` means the service default.
    pub model: PersistedMap<Option<String>>,
}

impl StateStores {
    /// Load all four stores from `dir`. Missing files start empty.
    pub async fn load(dir: &Path) -> Result<Self, KaiwaError> {
        Ok(Self {
            room: PersistedMap::load(dir, "room", HashMap::new()).await?,
            channel: PersistedSet::load(dir, "channel").await?,
            maxhistory: PersistedMap::load(dir, "maxhistory", HashMap::new()).await?,
            model: PersistedMap::load(dir, "model", HashMap::new()).await?,
        })
    }

    /// Flush every store in fixed order: room, channel, maxhistory, model.
    ///
    /// Each store is attempted even when an earlier one fails; the first
    /// failure is returned after all four attempts.
    pub async fn flush_all(&self) -> Result<(), KaiwaError> {
        let mut first_err = None;
        for (name, result) in [
            ("room", self.room.save().await),
            ("channel", self.channel.save().await),
            ("maxhistory", self.maxhistory.save().await),
            ("model", self.model.save().await),
        ] {
            if let Err(e) = result {
                error!(store = name, error = %e, "state store flush failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

/// Spawn the periodic flush task.
///
/// Flushes every `interval` until `token` is cancelled, then performs one
/// final flush before exiting. Flush failures are logged, never fatal.
pub fn spawn_flush_task(
    stores: Arc<StateStores>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it, state was just loaded.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    if stores.flush_all().await.is_ok() {
                        info!("final state flush complete");
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = stores.flush_all().await {
                        error!(error = %e, "periodic state flush failed");
                    } else {
                        debug!("periodic state flush complete");
                    }
                }
            }
        }
    })
}

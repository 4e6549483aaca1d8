// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session service: the single entry point front ends talk to.
//!
//! Every operation resolves the target conversation key first, then goes
//! through [`HistoryStore`] for anything touching turn data. The generation
//! provider is only ever called while no history lock is held: the service
//! snapshots under the lock, calls out, and appends in a second transaction.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use kaiwa_cooldown::Cooldown;
use kaiwa_core::{
    ConversationKey, ConversationName, GenerationProvider, InlineData, KaiwaError, MAIN_ALIAS,
    Turn, flip_roles,
};
use kaiwa_history::{HistoryStore, validate_document};
use kaiwa_state::StateStores;

/// The conversational session backend.
pub struct SessionService {
    history: HistoryStore,
    state: Arc<StateStores>,
    cooldown: Cooldown,
    provider: Arc<dyn GenerationProvider>,
    default_model: String,
}

impl SessionService {
    pub fn new(
        history: HistoryStore,
        state: Arc<StateStores>,
        provider: Arc<dyn GenerationProvider>,
        cooldown_window: Duration,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            history,
            state,
            cooldown: Cooldown::new(cooldown_window),
            provider,
            default_model: default_model.into(),
        }
    }

    /// The key of the user's active conversation.
    ///
    /// Falls back to main when the stored name no longer parses, which can
    /// only happen through hand-edited state files.
    async fn active_key(&self, user_id: u64) -> ConversationKey {
        let stored = self.state.room.get(user_id).await.flatten();
        match stored {
            None => ConversationKey::main(user_id),
            Some(raw) => match ConversationName::parse(&raw) {
                Ok(name) => ConversationKey::new(user_id, name),
                Err(_) => {
                    warn!(user_id, name = %raw, "stored conversation name invalid, using main");
                    ConversationKey::main(user_id)
                }
            },
        }
    }

    /// Resolve an optional explicit name; `None` means the active conversation.
    async fn resolve_key(
        &self,
        user_id: u64,
        name: Option<&str>,
    ) -> Result<ConversationKey, KaiwaError> {
        match name {
            None => Ok(self.active_key(user_id).await),
            Some(raw) => Ok(ConversationKey::new(user_id, ConversationName::parse(raw)?)),
        }
    }

    /// Handle an inbound user message.
    ///
    /// Returns `Ok(None)` when the channel is not enabled; the message is
    /// ignored without touching the cooldown. An accepted message consumes
    /// the user's cooldown window even if generation later fails.
    ///
    /// The user turn and the model reply are appended together, and only
    /// after the provider finished with a clean stop.
    pub async fn handle_message(
        &self,
        user_id: u64,
        channel_id: u64,
        text: Option<String>,
        attachments: Vec<InlineData>,
    ) -> Result<Option<String>, KaiwaError> {
        if !self.state.channel.contains(channel_id).await {
            return Ok(None);
        }
        if let Some(remaining) = self.cooldown.trigger(user_id) {
            debug!(user_id, remaining = ?remaining, "message rejected by cooldown");
            return Err(KaiwaError::RateLimited { remaining });
        }

        let user_turn = Turn::build(text, attachments)?;
        let key = self.active_key(user_id).await;
        let snapshot = self.history.snapshot(&key).await?;

        let window = self.state.maxhistory.get(user_id).await.flatten();
        let mut request = match window {
            Some(n) => {
                let n = n as usize;
                snapshot[snapshot.len().saturating_sub(n)..].to_vec()
            }
            None => snapshot,
        };
        request.push(user_turn.clone());

        let model = self.state.model.get(user_id).await.flatten();
        let generation = match self.provider.generate(&request, model.as_deref()).await {
            Ok(generation) => generation,
            Err(e) => {
                error!(user_id, error = %e, "generation failed");
                return Err(e);
            }
        };

        if !generation.finish_reason.is_stop() {
            warn!(user_id, reason = %generation.finish_reason, "generation did not stop cleanly");
            return Err(KaiwaError::NonStopFinish {
                reason: generation.finish_reason.to_string(),
            });
        }

        let reply = generation.turn.joined_text();
        self.history
            .with(&key, move |turns| {
                turns.push(user_turn);
                turns.push(generation.turn);
                Ok(())
            })
            .await?;

        info!(user_id, conversation = %key.storage_name(), "exchange recorded");
        Ok(Some(reply))
    }

    /// Remove one turn from the active conversation.
    ///
    /// Negative indices count from the end, so `-1` is the latest turn.
    pub async fn pop(&self, user_id: u64, index: i64) -> Result<Turn, KaiwaError> {
        let key = self.active_key(user_id).await;
        self.history
            .with(&key, move |turns| {
                let len = turns.len() as i64;
                let resolved = if index < 0 { len + index } else { index };
                if resolved < 0 || resolved >= len {
                    return Err(KaiwaError::NotFound(format!(
                        "turn index {index} (history has {len} turns)"
                    )));
                }
                Ok(turns.remove(resolved as usize))
            })
            .await
    }

    /// Erase all turns of the active conversation, keeping the record itself.
    pub async fn clear(&self, user_id: u64) -> Result<(), KaiwaError> {
        let key = self.active_key(user_id).await;
        self.history
            .with(&key, |turns| {
                turns.clear();
                Ok(())
            })
            .await
    }

    /// Swap user and model roles across the active conversation.
    pub async fn flip(&self, user_id: u64) -> Result<(), KaiwaError> {
        let key = self.active_key(user_id).await;
        self.history
            .with(&key, |turns| {
                flip_roles(turns);
                Ok(())
            })
            .await
    }

    /// The raw JSON document of a conversation, for download.
    pub async fn export(&self, user_id: u64, name: Option<&str>) -> Result<Vec<u8>, KaiwaError> {
        let key = self.resolve_key(user_id, name).await?;
        self.history.export(&key).await
    }

    /// Validate `document` and replace the conversation's turns with it.
    ///
    /// The stored record is untouched when validation fails.
    pub async fn import(
        &self,
        user_id: u64,
        name: Option<&str>,
        document: &Value,
    ) -> Result<(), KaiwaError> {
        let key = self.resolve_key(user_id, name).await?;
        let turns = validate_document(document)?;
        self.history.import(&key, &turns).await?;
        info!(user_id, conversation = %key.storage_name(), turns = turns.len(), "history imported");
        Ok(())
    }

    /// Switch the user's active conversation. `None` or the main alias
    /// switches back to main. Returns the name now active, for display.
    pub async fn change(
        &self,
        user_id: u64,
        name: Option<&str>,
    ) -> Result<String, KaiwaError> {
        let parsed = match name {
            None => None,
            Some(raw) => ConversationName::parse(raw)?,
        };
        let display_name = match &parsed {
            None => MAIN_ALIAS.to_string(),
            Some(n) => n.as_str().to_string(),
        };
        self.state
            .room
            .set(user_id, parsed.map(|n| n.as_str().to_string()))
            .await;
        info!(user_id, conversation = %display_name, "active conversation changed");
        Ok(display_name)
    }

    /// Delete a conversation's history record.
    ///
    /// The user's active-conversation entry is reset to main whenever it
    /// referenced the deleted record, even if the record did not exist.
    pub async fn delete(&self, user_id: u64, name: Option<&str>) -> Result<(), KaiwaError> {
        let key = self.resolve_key(user_id, name).await?;
        let result = self.history.delete(&key).await;

        let active = self.state.room.get(user_id).await.flatten();
        let deleted = key.name().map(|n| n.as_str().to_string());
        if name.is_none() || active == deleted {
            self.state.room.set(user_id, None).await;
        }
        result
    }

    /// All of the user's conversation names, main shown under its alias.
    pub async fn list(&self, user_id: u64) -> Result<Vec<String>, KaiwaError> {
        let stems = self.history.list_names(&user_id.to_string()).await?;
        Ok(stems
            .iter()
            .filter_map(|stem| match ConversationKey::split_storage_name(stem) {
                Some((id, name)) if id == user_id => {
                    Some(name.map_or_else(|| MAIN_ALIAS.to_string(), str::to_string))
                }
                _ => None,
            })
            .collect())
    }

    /// The name of the user's active conversation, main shown under its alias.
    pub async fn current(&self, user_id: u64) -> String {
        self.active_key(user_id)
            .await
            .name()
            .map_or_else(|| MAIN_ALIAS.to_string(), |n| n.as_str().to_string())
    }

    /// Set or clear the user's history window. The stored record is never
    /// truncated; the window only limits what generation requests carry.
    pub async fn set_maxhistory(&self, user_id: u64, size: Option<u64>) {
        self.state.maxhistory.set(user_id, size).await;
    }

    /// Set or clear the user's model override.
    pub async fn set_model(&self, user_id: u64, model: Option<String>) {
        self.state.model.set(user_id, model).await;
    }

    /// The model the user's requests currently go to.
    pub async fn current_model(&self, user_id: u64) -> String {
        self.state
            .model
            .get(user_id)
            .await
            .flatten()
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Enable responses in a channel. Returns false if it was already enabled.
    pub async fn enable_channel(&self, channel_id: u64) -> bool {
        let inserted = self.state.channel.insert(channel_id).await;
        if inserted {
            info!(channel_id, "channel enabled");
        }
        inserted
    }

    /// Disable responses in a channel. Returns false if it was not enabled.
    pub async fn disable_channel(&self, channel_id: u64) -> bool {
        let removed = self.state.channel.remove(channel_id).await;
        if removed {
            info!(channel_id, "channel disabled");
        }
        removed
    }
}

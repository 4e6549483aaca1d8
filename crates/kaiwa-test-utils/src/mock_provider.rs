// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation provider for deterministic testing.
//!
//! Scripted replies are popped from a FIFO queue; an empty queue yields a
//! default text reply with a clean stop. Every call is recorded so tests
//! can assert on the history window and model override the facade sent.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kaiwa_core::{
    CredentialFailure, FinishReason, Generation, GenerationProvider, KaiwaError, Role, Turn,
};

/// One scripted provider outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A completion with the given text and finish reason.
    Reply {
        text: String,
        finish_reason: FinishReason,
    },
    /// Every credential failed.
    Exhausted(Vec<CredentialFailure>),
}

/// What the facade asked for on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The request history, as sent (window already applied).
    pub turns: Vec<Turn>,
    pub model: Option<String>,
}

/// A generation provider returning pre-configured outcomes.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain text reply finishing with a clean stop.
    pub async fn push_text(&self, text: impl Into<String>) {
        self.replies.lock().await.push_back(ScriptedReply::Reply {
            text: text.into(),
            finish_reason: FinishReason::Stop,
        });
    }

    /// Queue an arbitrary scripted outcome.
    pub async fn push(&self, reply: ScriptedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Calls made so far, oldest first.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate(
        &self,
        turns: &[Turn],
        model: Option<&str>,
    ) -> Result<Generation, KaiwaError> {
        self.calls.lock().await.push(RecordedCall {
            turns: turns.to_vec(),
            model: model.map(str::to_string),
        });

        let scripted = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(ScriptedReply::Reply {
                text: "mock reply".to_string(),
                finish_reason: FinishReason::Stop,
            });

        match scripted {
            ScriptedReply::Reply {
                text,
                finish_reason,
            } => Ok(Generation {
                turn: Turn::text(Role::Model, text),
                finish_reason,
            }),
            ScriptedReply::Exhausted(failures) => Err(KaiwaError::Generation { failures }),
        }
    }
}

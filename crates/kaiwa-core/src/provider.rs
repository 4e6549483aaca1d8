// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The generation-service seam.
//!
//! The session facade only knows this trait: an ordered sequence of turns in,
//! one model turn plus a finish indicator out. The Gemini client implements
//! it; tests substitute a mock.

use async_trait::async_trait;

use crate::error::KaiwaError;
use crate::types::Turn;

/// How the generation service ended a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Clean stop. Only this finish allows history to be appended.
    Stop,
    /// Any other finish (truncation, safety block, ...), verbatim.
    Other(String),
}

impl FinishReason {
    /// Map a wire-format reason string.
    pub fn from_wire(reason: &str) -> Self {
        if reason == "STOP" {
            FinishReason::Stop
        } else {
            FinishReason::Other(reason.to_string())
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, FinishReason::Stop)
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => f.write_str("STOP"),
            FinishReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// One failed attempt against one credential.
#[derive(Debug, Clone)]
pub struct CredentialFailure {
    /// Trailing characters of the credential, enough to identify it in logs
    /// without disclosing it.
    pub key_hint: String,
    /// HTTP status of the failed attempt.
    pub status: u16,
    /// Response body as returned by the service.
    pub body: serde_json::Value,
}

/// A successful completion.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The model's reply turn.
    pub turn: Turn,
    pub finish_reason: FinishReason,
}

/// An LLM generation service.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the given history, oldest turn first.
    ///
    /// `model` overrides the service's default model when set. Exhausting
    /// every credential yields [`KaiwaError::Generation`] carrying one
    /// [`CredentialFailure`] per attempt.
    async fn generate(
        &self,
        turns: &[Turn],
        model: Option<&str>,
    ) -> Result<Generation, KaiwaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_from_wire() {
        assert_eq!(FinishReason::from_wire("STOP"), FinishReason::Stop);
        assert!(FinishReason::from_wire("STOP").is_stop());

        let other = FinishReason::from_wire("MAX_TOKENS");
        assert_eq!(other, FinishReason::Other("MAX_TOKENS".into()));
        assert!(!other.is_stop());
        assert_eq!(other.to_string(), "MAX_TOKENS");
    }
}

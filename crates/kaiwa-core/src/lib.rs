// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Kaiwa session backend.
//!
//! This crate provides the conversation-turn data model, conversation-key
//! derivation, the shared error type, and the generation-provider trait
//! used throughout the Kaiwa workspace.

pub mod error;
pub mod key;
pub mod provider;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KaiwaError;
pub use key::{ConversationKey, ConversationName, MAIN_ALIAS};
pub use provider::{CredentialFailure, FinishReason, Generation, GenerationProvider};
pub use types::{InlineData, Part, Role, Turn, flip_roles};

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation turn data model shared by every Kaiwa crate.
//!
//! A [`Turn`] is one message in a conversation: a role plus a non-empty
//! sequence of [`Part`]s. Parts are either inline text or an inline binary
//! attachment carried as base64 text. The base64 form is the at-rest and
//! wire representation; raw bytes are decoded on demand via
//! [`InlineData::decode`], never on load.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::KaiwaError;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// The opposite role.
    pub fn flipped(self) -> Self {
        match self {
            Role::User => Role::Model,
            Role::Model => Role::User,
        }
    }
}

/// An inline binary attachment. `data` is base64 text, exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl InlineData {
    /// Build inline data from raw bytes, encoding to the at-rest base64 form.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    /// Decode the stored base64 text back to raw bytes.
    ///
    /// Only consumers that need raw bytes (e.g. re-upload to a generation
    /// service) call this; the storage layer round-trips the text form.
    pub fn decode(&self) -> Result<Vec<u8>, KaiwaError> {
        BASE64
            .decode(&self.data)
            .map_err(|e| KaiwaError::Format(format!("invalid base64 inline data: {e}")))
    }
}

/// One content fragment of a turn.
///
/// Externally tagged, so the wire form is `{"text": "..."}` or
/// `{"inline_data": {...}}` -- exactly one of the two. Untrusted documents
/// do not come through serde; they go through the history validator first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inline_data")]
    InlineData(InlineData),
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    /// Build a user turn from optional text plus attachments.
    ///
    /// Returns a `Format` error when both inputs are empty: a turn's parts
    /// sequence is never empty after a successful build.
    pub fn build(
        text: Option<String>,
        attachments: Vec<InlineData>,
    ) -> Result<Self, KaiwaError> {
        let mut parts = Vec::with_capacity(attachments.len() + 1);
        if let Some(text) = text {
            parts.push(Part::Text(text));
        }
        parts.extend(attachments.into_iter().map(Part::InlineData));
        if parts.is_empty() {
            return Err(KaiwaError::Format(
                "a turn must carry text or at least one attachment".into(),
            ));
        }
        Ok(Self {
            role: Role::User,
            parts,
        })
    }

    /// A single-part text turn.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text of every text part.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineData(_) => None,
            })
            .collect()
    }
}

/// Swap `user` and `model` on every turn in place.
///
/// This re-labels a transcript's perspective; applying it twice restores
/// the original role sequence.
pub fn flip_roles(turns: &mut [Turn]) {
    for turn in turns {
        turn.role = turn.role.flipped();
    }
}

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation naming and storage-key derivation.
//!
//! Every user owns one unnamed "main" conversation plus any number of named
//! ones. The storage name is `"{user_id}"` for main and `"{user_id}_{name}"`
//! otherwise; a key uniquely addresses one persisted history record.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KaiwaError;

/// Case-insensitive alias a user types to address the main conversation.
pub const MAIN_ALIAS: &str = "<main>";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("static pattern"));

/// A validated conversation name: `\w+`, never the `<main>` alias itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationName(String);

impl ConversationName {
    /// Validate a raw name.
    ///
    /// `<main>` (any case) normalizes to `None`, i.e. the main conversation.
    /// Anything that is not `\w+` is rejected with `InvalidName`.
    pub fn parse(raw: &str) -> Result<Option<Self>, KaiwaError> {
        if raw.eq_ignore_ascii_case(MAIN_ALIAS) {
            return Ok(None);
        }
        if NAME_RE.is_match(raw) {
            Ok(Some(Self(raw.to_string())))
        } else {
            Err(KaiwaError::InvalidName(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Addresses one persisted history record: a user plus an optional name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    user_id: u64,
    name: Option<ConversationName>,
}

impl ConversationKey {
    pub fn new(user_id: u64, name: Option<ConversationName>) -> Self {
        Self { user_id, name }
    }

    /// The user's unnamed main conversation.
    pub fn main(user_id: u64) -> Self {
        Self {
            user_id,
            name: None,
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn name(&self) -> Option<&ConversationName> {
        self.name.as_ref()
    }

    /// The file stem this key persists under.
    pub fn storage_name(&self) -> String {
        match &self.name {
            None => self.user_id.to_string(),
            Some(name) => format!("{}_{name}", self.user_id),
        }
    }

    /// Split a storage name back into `(user_id, optional name)`.
    ///
    /// Returns `None` for stems that were not produced by
    /// [`storage_name`](Self::storage_name).
    pub fn split_storage_name(stem: &str) -> Option<(u64, Option<&str>)> {
        match stem.split_once('_') {
            None => stem.parse().ok().map(|id| (id, None)),
            Some((id, name)) => id.parse().ok().map(|id| (id, Some(name))),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted runtime state for the Kaiwa session backend.
//!
//! Four small key-value stores (active conversation, enabled channels,
//! history-window override, model override) loaded at startup, flushed
//! periodically and on shutdown.

pub mod registry;
pub mod store;

pub use registry::{StateStores, spawn_flush_task};
pub use store::{PersistedMap, PersistedSet};

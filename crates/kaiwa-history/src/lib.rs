// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable per-conversation history for the Kaiwa session backend.
//!
//! [`store::HistoryStore`] keeps one JSON record per conversation key with
//! serialized read-modify-write transactions; [`validate`] checks untrusted
//! imported documents before they may replace a stored record.

pub mod store;
pub mod validate;

pub use store::HistoryStore;
pub use validate::validate_document;

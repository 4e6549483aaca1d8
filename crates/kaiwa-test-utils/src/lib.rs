// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test helpers for the Kaiwa workspace.

pub mod mock_provider;

pub use mock_provider::{MockProvider, ScriptedReply};

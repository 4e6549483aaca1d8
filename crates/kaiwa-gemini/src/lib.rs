// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini provider adapter for the Kaiwa session backend.

pub mod client;
pub mod types;

pub use client::GeminiClient;

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session facade tying history, state, cooldown and generation together.

pub mod service;

pub use service::SessionService;

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Kaiwa session backend.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), user config file lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! let config = kaiwa_config::load_config().expect("config errors");
//! println!("history dir: {}", config.storage.history_dir);
//! ```

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::KaiwaConfig;

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Kaiwa configuration.
///
/// Loaded from `kaiwa.toml` with `KAIWA_*` environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KaiwaConfig {
    /// Session behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// On-disk locations for history and state.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gemini generation service settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Session behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Minimum interval between accepted messages from one user, in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,

    /// Interval between periodic state flushes, in seconds.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            cooldown_secs: default_cooldown_secs(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cooldown_secs() -> f64 {
    5.0
}

fn default_flush_interval_secs() -> u64 {
    60
}

/// On-disk storage locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding one JSON history record per conversation key.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,

    /// Directory holding the four state store files.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_dir: default_history_dir(),
            state_dir: default_state_dir(),
        }
    }
}

fn default_history_dir() -> String {
    "history".to_string()
}

fn default_state_dir() -> String {
    "state".to_string()
}

/// Gemini generation service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API keys tried in shuffled order until one succeeds.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Default model, used when a user has no override.
    #[serde(default = "default_model")]
    pub model: String,

    /// Service endpoint; `{model}` is substituted per request.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent".to_string()
}

// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order: compiled defaults, then `~/.config/kaiwa/kaiwa.toml`, then
//! `./kaiwa.toml`, then `KAIWA_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KaiwaConfig;

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<KaiwaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KaiwaConfig::default()))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("kaiwa/kaiwa.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("kaiwa.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KaiwaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KaiwaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KaiwaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KaiwaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Map `KAIWA_*` env vars onto config paths.
///
/// Uses explicit `map()` rather than `Env::split("_")` so keys containing
/// underscores keep their names: `KAIWA_STORAGE_HISTORY_DIR` must become
/// `storage.history_dir`, not `storage.history.dir`.
fn env_provider() -> Env {
    Env::prefixed("KAIWA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gemini_", "gemini.", 1);
        mapped.into()
    })
}

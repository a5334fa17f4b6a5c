// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parlor.toml` > `~/.config/parlor/parlor.toml` >
//! `/etc/parlor/parlor.toml` with environment variable overrides via the
//! `PARLOR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParlorConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parlor/parlor.toml` (system-wide)
/// 3. `~/.config/parlor/parlor.toml` (user XDG config)
/// 4. `./parlor.toml` (local directory)
/// 5. `PARLOR_*` environment variables
pub fn load_config() -> Result<ParlorConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ParlorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParlorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::file("/etc/parlor/parlor.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("parlor/parlor.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("parlor.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `PARLOR_QUOTA_DAILY_LIMIT` must map to
/// `quota.daily_limit`, not `quota.daily.limit`.
fn env_provider() -> Env {
    Env::prefixed("PARLOR_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PARLOR_QUOTA_DAILY_LIMIT -> "quota_daily_limit"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("quota_", "quota.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("worker_", "worker.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}

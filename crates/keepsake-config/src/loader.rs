// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keepsake.toml` > `~/.config/keepsake/keepsake.toml` >
//! `/etc/keepsake/keepsake.toml` with environment variable overrides via `KEEPSAKE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeepsakeConfig;

/// Local config file name, looked up in the working directory.
pub const LOCAL_CONFIG: &str = "keepsake.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/keepsake/keepsake.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keepsake/keepsake.toml`
/// 3. `~/.config/keepsake/keepsake.toml`
/// 4. `./keepsake.toml`
/// 5. `KEEPSAKE_*` environment variables
pub fn load_config() -> Result<KeepsakeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment without extracting it.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// `~/.config/keepsake/keepsake.toml`, if a config directory exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("keepsake").join(LOCAL_CONFIG))
}

/// Maps `KEEPSAKE_<SECTION>_<KEY>` onto `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `KEEPSAKE_ARCHIVE_GAP_THRESHOLD_SECS` must become
/// `archive.gap_threshold_secs`.
fn env_provider() -> Env {
    Env::prefixed("KEEPSAKE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ["agent", "archive", "fetch", "onebot"] {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

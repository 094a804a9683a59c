// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::KeepsakeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &KeepsakeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.agent.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` is not one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    for (key, value) in [
        ("archive.saves_dir", &config.archive.saves_dir),
        ("archive.outs_dir", &config.archive.outs_dir),
        ("fetch.error_log", &config.fetch.error_log),
        ("onebot.input", &config.onebot.input),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    if config.archive.saves_dir.trim() == config.archive.outs_dir.trim() {
        errors.push(ConfigError::Validation {
            message: "archive.saves_dir and archive.outs_dir must differ".to_string(),
        });
    }

    for (key, value) in [
        ("archive.gap_threshold_secs", config.archive.gap_threshold_secs),
        ("fetch.timeout_secs", config.fetch.timeout_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than 0"),
            });
        }
    }

    for (key, value) in [
        ("archive.max_bundle_depth", config.archive.max_bundle_depth),
        ("fetch.max_concurrent", config.fetch.max_concurrent),
        ("onebot.channel_buffer", config.onebot.channel_buffer),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keepsake archiver.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Keepsake configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeepsakeConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Output layout and session grouping.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Attachment download settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// OneBot host event stream settings.
    #[serde(default)]
    pub onebot: OneBotConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name used in log lines.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "keepsake".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Output layout and session grouping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Root of the raw per-conversation copies (`<saves_dir>/<conversation>/<time>.json`).
    #[serde(default = "default_saves_dir")]
    pub saves_dir: String,

    /// Root of the bucketed output (`<outs_dir>/<day>/<bucket>/...`).
    #[serde(default = "default_outs_dir")]
    pub outs_dir: String,

    /// Idle gap, in seconds, after which a new session bucket starts.
    #[serde(default = "default_gap_threshold_secs")]
    pub gap_threshold_secs: u64,

    /// Maximum nesting of forward bundles the resolver will enter.
    #[serde(default = "default_max_bundle_depth")]
    pub max_bundle_depth: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            saves_dir: default_saves_dir(),
            outs_dir: default_outs_dir(),
            gap_threshold_secs: default_gap_threshold_secs(),
            max_bundle_depth: default_max_bundle_depth(),
        }
    }
}

fn default_saves_dir() -> String {
    "saves".to_string()
}

fn default_outs_dir() -> String {
    "outs".to_string()
}

fn default_gap_threshold_secs() -> u64 {
    600
}

fn default_max_bundle_depth() -> usize {
    16
}

/// Attachment download configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Total timeout for a single download, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Append-only log receiving one line per failed download.
    #[serde(default = "default_error_log")]
    pub error_log: String,

    /// Downloads issued concurrently for a single event.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// User-Agent header sent with every download.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            error_log: default_error_log(),
            max_concurrent: default_max_concurrent(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_error_log() -> String {
    "error.log".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_user_agent() -> String {
    concat!("keepsake/", env!("CARGO_PKG_VERSION")).to_string()
}

/// OneBot host event stream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OneBotConfig {
    /// Newline-delimited event source. `-` reads standard input.
    #[serde(default = "default_input")]
    pub input: String,

    /// Capacity of the queue between the reader task and the dispatcher.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

impl Default for OneBotConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

fn default_input() -> String {
    "-".to_string()
}

fn default_channel_buffer() -> usize {
    100
}

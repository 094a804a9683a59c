// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output directory layout and JSON persistence.
//!
//! ```text
//! <saves>/<conversation_id>/<YYYY-MM-DD HH-MM-SS>.json   raw copy of every event
//! <outs>/<day>/<bucket_id>/<event_id>.json               bucketed copy
//! <outs>/<day>/<bundle_id>/<bundle_id>.json              forward bundle snapshot
//! <outs>/<day>/<bucket_or_bundle_id>/<file>              downloaded media
//! ```

use std::path::{Path, PathBuf};

use keepsake_config::model::ArchiveConfig;
use keepsake_core::KeepsakeError;
use serde::Serialize;

/// Resolves archive paths below the two output roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    saves: PathBuf,
    outs: PathBuf,
}

impl Layout {
    pub fn new(saves: impl Into<PathBuf>, outs: impl Into<PathBuf>) -> Self {
        Self {
            saves: saves.into(),
            outs: outs.into(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(&config.saves_dir, &config.outs_dir)
    }

    pub fn saves_root(&self) -> &Path {
        &self.saves
    }

    pub fn outs_root(&self) -> &Path {
        &self.outs
    }

    pub fn raw_event_path(&self, conversation_id: i64, formatted_timestamp: &str) -> PathBuf {
        self.saves
            .join(conversation_id.to_string())
            .join(format!("{formatted_timestamp}.json"))
    }

    /// Directory holding every bucket and bundle of one day.
    pub fn day_dir(&self, day: &str) -> PathBuf {
        self.outs.join(day)
    }

    pub fn bucket_event_path(&self, day: &str, group: i64, event_id: i64) -> PathBuf {
        self.day_dir(day)
            .join(group.to_string())
            .join(format!("{event_id}.json"))
    }
}

/// Encodes host-supplied text as exactly one normal path component.
///
/// Separators and NUL are percent-encoded, and names made only of dots
/// (or empty) have their dots encoded, so the result can never climb out
/// of, or replace, the directory it is joined onto.
pub fn path_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            '\0' => out.push_str("%00"),
            other => out.push(other),
        }
    }
    if out.chars().all(|c| c == '.') {
        out = "%2E".repeat(out.len().max(1));
    }
    out
}

/// Directory of a bucket or bundle below a day directory.
pub fn container_dir(day_dir: &Path, container: &str) -> PathBuf {
    day_dir.join(path_component(container))
}

/// Path of a bundle snapshot below a day directory.
pub fn snapshot_path(day_dir: &Path, bundle_id: &str) -> PathBuf {
    let name = path_component(bundle_id);
    day_dir.join(&name).join(format!("{name}.json"))
}

/// Serializes `value` as 4-space indented JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, KeepsakeError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes `value` as pretty JSON to `path`, creating parent directories.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), KeepsakeError> {
    let bytes = to_pretty_json(value)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| KeepsakeError::storage(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| KeepsakeError::storage(path, e))
}

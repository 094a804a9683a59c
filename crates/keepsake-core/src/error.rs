// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keepsake archiver.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// The primary error type returned by archiving and channel operations.
#[derive(Debug, Error)]
pub enum KeepsakeError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors while creating directories or writing archive files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serialization of an event or bundle snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The session grouper rejected the event.
    #[error(transparent)]
    Grouper(#[from] GrouperError),

    /// Channel errors (host stream closed, unreadable input, malformed event).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeepsakeError {
    /// Wraps an I/O error together with the path it occurred on.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the session grouper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrouperError {
    /// Timestamp is equal to or earlier than the previous one.
    #[error("timestamps must strictly increase: got {current}, last was {last}")]
    OutOfOrder {
        current: NaiveDateTime,
        last: NaiveDateTime,
    },

    /// Timestamp string does not match the archive format.
    #[error("invalid timestamp `{value}`: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// A single failed download attempt.
///
/// Fetch errors are recovered where they happen: they are written to the
/// error log and never abort archiving of the surrounding event.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout, or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// Writing the payload to its destination failed.
    #[error("write error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

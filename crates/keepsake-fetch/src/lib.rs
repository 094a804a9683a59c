// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment download support for Keepsake.
//!
//! [`HttpFetcher`] performs single-attempt downloads with a bounded
//! timeout and records every failure in the append-only [`ErrorLog`].

pub mod error_log;
pub mod http;

pub use error_log::ErrorLog;
pub use http::HttpFetcher;

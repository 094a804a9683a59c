// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fetcher trait for single-attempt payload downloads.

use std::path::Path;

use async_trait::async_trait;

use crate::error::FetchError;

/// Retrieves a remote payload into a local file.
///
/// Implementations make exactly one attempt. On failure the destination is
/// left untouched and the error is recorded by the implementation; callers
/// treat the returned error as informational.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}

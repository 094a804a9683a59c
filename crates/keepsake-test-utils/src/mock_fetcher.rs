// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock fetcher for deterministic testing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use keepsake_core::{FetchError, Fetcher};

/// Payload written by successful mock downloads.
pub const MOCK_PAYLOAD: &[u8] = b"mock-payload";

/// One recorded `fetch` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub url: String,
    pub destination: PathBuf,
}

/// A fetcher that never touches the network.
///
/// Every call is recorded. URLs registered with [`failing_on`](Self::failing_on)
/// fail with a 404 status; all others write [`MOCK_PAYLOAD`] to the
/// destination, creating parent directories.
#[derive(Debug, Default)]
pub struct MockFetcher {
    calls: Mutex<Vec<FetchCall>>,
    failing: HashSet<String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every fetch of `url` fail.
    pub fn failing_on(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(FetchCall {
                url: url.to_string(),
                destination: destination.to_path_buf(),
            });
        }

        if self.failing.contains(url) {
            return Err(FetchError::Status { status: 404 });
        }

        let io_err = |source| FetchError::Io {
            path: destination.to_path_buf(),
            source,
        };
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(destination, MOCK_PAYLOAD)
            .await
            .map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new().failing_on("http://bad");
        let good = dir.path().join("a").join("ok.bin");

        fetcher.fetch("http://good", &good).await.unwrap();
        assert!(fetcher.fetch("http://bad", &dir.path().join("x")).await.is_err());

        assert_eq!(fetcher.call_count(), 2);
        assert_eq!(std::fs::read(&good).unwrap(), MOCK_PAYLOAD);
        assert!(!dir.path().join("x").exists());
        assert_eq!(fetcher.calls()[0].url, "http://good");
    }
}

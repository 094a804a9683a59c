// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only log of failed downloads.

use std::path::{Path, PathBuf};

use keepsake_core::FetchError;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Process-wide log receiving one line per failed fetch.
///
/// Lines look like `error: HTTP status 404, url: <url>, file: <destination>`.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    // Serializes appends from concurrent downloads.
    lock: Mutex<()>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line describing a failed download.
    pub async fn append(
        &self,
        error: &FetchError,
        url: &str,
        destination: &Path,
    ) -> std::io::Result<()> {
        let line = format_line(error, url, destination);
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

fn format_line(error: &FetchError, url: &str, destination: &Path) -> String {
    let text = error.to_string().replace('\n', " ");
    format!(
        "error: {text}, url: {url}, file: {}\n",
        destination.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_has_error_url_and_destination() {
        let line = format_line(
            &FetchError::Status { status: 404 },
            "http://cdn.example/a.jpg",
            Path::new("outs/2024-01-01/1/a.jpg"),
        );
        assert_eq!(
            line,
            "error: HTTP status 404, url: http://cdn.example/a.jpg, file: outs/2024-01-01/1/a.jpg\n"
        );
    }

    #[test]
    fn multiline_errors_stay_on_one_line() {
        let line = format_line(
            &FetchError::Transport("connect\nrefused".into()),
            "http://x",
            Path::new("f"),
        );
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[tokio::test]
    async fn appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path().join("logs").join("error.log"));
        let err = FetchError::Status { status: 500 };

        log.append(&err, "http://a", Path::new("a")).await.unwrap();
        log.append(&err, "http://b", Path::new("b")).await.unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().contains("http://b"));
    }
}

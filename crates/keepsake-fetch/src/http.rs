// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest-backed [`Fetcher`] with a bounded total timeout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use keepsake_config::model::FetchConfig;
use keepsake_core::{FetchError, Fetcher, KeepsakeError};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::error_log::ErrorLog;

/// Downloads attachment payloads over HTTP(S).
///
/// Each call makes exactly one request. Failures are appended to the
/// shared [`ErrorLog`] and leave the destination path absent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    error_log: Arc<ErrorLog>,
}

impl HttpFetcher {
    /// Creates a fetcher from the `[fetch]` configuration section.
    pub fn new(config: &FetchConfig) -> Result<Self, KeepsakeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| KeepsakeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            error_log: Arc::new(ErrorLog::new(&config.error_log)),
        })
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<usize, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        stream_to_file(response, destination).await
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        match self.download(url, destination).await {
            Ok(size) => {
                debug!(url, path = %destination.display(), size, "attachment downloaded");
                Ok(())
            }
            Err(e) => {
                warn!(url, path = %destination.display(), error = %e, "attachment download failed");
                if let Err(log_err) = self.error_log.append(&e, url, destination).await {
                    error!(
                        log = %self.error_log.path().display(),
                        error = %log_err,
                        "failed to append to error log"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Streams the response body next to `destination` and renames it into place.
///
/// A failure mid-body leaves only the `.part` file behind, which is then
/// removed, never a truncated file under the final name.
async fn stream_to_file(response: reqwest::Response, destination: &Path) -> Result<usize, FetchError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| FetchError::Io { path, source }
    };

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_err(parent))?;
    }

    let partial = partial_path(destination);
    let written = match write_body(response, &partial).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
    };

    if let Err(source) = tokio::fs::rename(&partial, destination).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(FetchError::Io {
            path: destination.to_path_buf(),
            source,
        });
    }
    Ok(written)
}

async fn write_body(response: reqwest::Response, partial: &Path) -> Result<usize, FetchError> {
    let io_err = |source: std::io::Error| FetchError::Io {
        path: partial.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(partial).await.map_err(io_err)?;
    let mut body = response.bytes_stream();
    let mut written = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| FetchError::Transport(e.to_string()))?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len();
    }
    file.flush().await.map_err(io_err)?;
    Ok(written)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(dir: &Path, timeout_secs: u64) -> HttpFetcher {
        let config = FetchConfig {
            timeout_secs,
            error_log: dir.join("error.log").display().to_string(),
            ..FetchConfig::default()
        };
        HttpFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn success_writes_exact_bytes_and_creates_directories() {
        let server = MockServer::start().await;
        let payload = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        Mock::given(method("GET"))
            .and(path("/media/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = test_fetcher(dir.path(), 30);
        assert_eq!(fetcher.error_log().path(), dir.path().join("error.log"));
        let dest = dir.path().join("outs").join("2024-01-01").join("1").join("cat.png");

        fetcher
            .fetch(&format!("{}/media/cat.png", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert!(!partial_path(&dest).exists());
        assert!(!dir.path().join("error.log").exists());
    }

    #[tokio::test]
    async fn client_error_logs_one_line_and_skips_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = test_fetcher(dir.path(), 30);
        let dest = dir.path().join("outs").join("missing.jpg");
        let url = format!("{}/gone.jpg", server.uri());

        let err = fetcher.fetch(&url, &dest).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404 }));
        assert!(!dest.exists());

        let log = std::fs::read_to_string(dir.path().join("error.log")).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains(&url));
        assert!(log.contains("missing.jpg"));
    }

    #[tokio::test]
    async fn server_error_is_logged_too() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = test_fetcher(dir.path(), 30);
        let dest = dir.path().join("v.mp4");

        let err = fetcher
            .fetch(&format!("{}/v.mp4", server.uri()), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503 }));
        assert!(!dest.exists());

        let log = std::fs::read_to_string(dir.path().join("error.log")).unwrap();
        assert!(log.starts_with("error: HTTP status 503"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = test_fetcher(dir.path(), 1);
        let dest = dir.path().join("late.bin");

        let err = fetcher
            .fetch(&format!("{}/late.bin", server.uri()), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn partial_path_keeps_extension_visible() {
        assert_eq!(
            partial_path(Path::new("outs/a/b.jpg")),
            PathBuf::from("outs/a/b.jpg.part")
        );
    }
}

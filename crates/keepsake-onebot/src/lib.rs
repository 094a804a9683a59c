// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OneBot v11 channel adapter for Keepsake.
//!
//! Reads newline-delimited OneBot JSON events (as pushed by a reverse
//! connection relay or replayed from a capture file), keeps the group and
//! private chat messages, and hands them to the dispatcher as [`Event`]s.

pub mod handler;
mod segments;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keepsake_config::model::OneBotConfig;
use keepsake_core::{AdapterType, ChannelAdapter, Event, HealthStatus, KeepsakeError, PluginAdapter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type LineSource = Box<dyn AsyncBufRead + Send + Unpin>;

/// OneBot channel adapter implementing [`ChannelAdapter`].
///
/// A reader task parses one event per line and queues it. Blank, malformed,
/// and non-message lines are logged and skipped without stopping the stream.
pub struct OneBotChannel {
    // Taken once by `connect`.
    source: Mutex<Option<LineSource>>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<Event>>,
    inbound_tx: Option<mpsc::Sender<Event>>,
    reader_handle: Option<tokio::task::JoinHandle<()>>,
    finished: Arc<AtomicBool>,
}

impl OneBotChannel {
    /// Creates a channel reading from `reader`.
    pub fn from_reader<R>(reader: R, buffer: usize) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer.max(1));
        Self {
            source: Mutex::new(Some(Box::new(reader))),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx: Some(inbound_tx),
            reader_handle: None,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Opens the configured input: standard input for `-`, a file otherwise.
    pub async fn open(config: &OneBotConfig) -> Result<Self, KeepsakeError> {
        if config.input == "-" {
            info!("reading OneBot events from stdin");
            return Ok(Self::from_reader(
                BufReader::new(tokio::io::stdin()),
                config.channel_buffer,
            ));
        }

        let file = tokio::fs::File::open(&config.input)
            .await
            .map_err(|e| KeepsakeError::Channel {
                message: format!("cannot open OneBot input {}", config.input),
                source: Some(Box::new(e)),
            })?;
        info!(input = %config.input, "reading OneBot events from file");
        Ok(Self::from_reader(BufReader::new(file), config.channel_buffer))
    }
}

/// Parses one input line.
///
/// `Ok(None)` means the line carries nothing to archive.
pub fn parse_line(line: &str) -> Result<Option<Event>, KeepsakeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(line)?;
    handler::to_event(value)
}

async fn read_lines(
    mut source: LineSource,
    tx: mpsc::Sender<Event>,
    finished: Arc<AtomicBool>,
) {
    let mut line = String::new();
    let mut line_no: u64 = 0;
    loop {
        line.clear();
        match source.read_line(&mut line).await {
            Ok(0) => {
                info!(lines = line_no, "OneBot input ended");
                break;
            }
            Ok(_) => {
                line_no += 1;
                match parse_line(&line) {
                    Ok(Some(event)) => {
                        debug!(line = line_no, event = event.id, "queued OneBot event");
                        if tx.send(event).await.is_err() {
                            warn!("inbound channel closed, stopping reader");
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(line = line_no, error = %e, "skipping unreadable event"),
                }
            }
            Err(e) => {
                warn!(error = %e, "OneBot input read failed");
                break;
            }
        }
    }
    finished.store(true, Ordering::SeqCst);
}

#[async_trait]
impl PluginAdapter for OneBotChannel {
    fn name(&self) -> &str {
        "onebot"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        if self.finished.load(Ordering::SeqCst) {
            Ok(HealthStatus::Degraded("input stream ended".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), KeepsakeError> {
        debug!("OneBot channel shutting down");
        if let Some(handle) = &self.reader_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for OneBotChannel {
    async fn connect(&mut self) -> Result<(), KeepsakeError> {
        if self.reader_handle.is_some() {
            return Ok(());
        }

        let source = self
            .source
            .get_mut()
            .ok()
            .and_then(Option::take)
            .ok_or_else(|| KeepsakeError::Channel {
                message: "OneBot input already consumed".into(),
                source: None,
            })?;
        // The reader owns the only sender, so the queue closes when input ends.
        let tx = self.inbound_tx.take().ok_or_else(|| KeepsakeError::Channel {
            message: "OneBot channel already connected".into(),
            source: None,
        })?;

        self.reader_handle = Some(tokio::spawn(read_lines(
            source,
            tx,
            Arc::clone(&self.finished),
        )));
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Event>, KeepsakeError> {
        if self.reader_handle.is_none() {
            return Err(KeepsakeError::Channel {
                message: "OneBot channel is not connected".into(),
                source: None,
            });
        }
        Ok(self.inbound_rx.lock().await.recv().await)
    }
}

impl Drop for OneBotChannel {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

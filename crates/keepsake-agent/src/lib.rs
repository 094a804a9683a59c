// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion dispatcher for Keepsake.
//!
//! The [`IngestionDispatcher`] owns the [`EventArchiver`] and is the only
//! task that touches it: events are pulled from the channel one at a time
//! and archived in arrival order.

pub mod shutdown;

use keepsake_archive::{ArchiveOutcome, EventArchiver};
use keepsake_core::{ChannelAdapter, ConversationKind, Event, KeepsakeError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters accumulated over one dispatcher run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events pulled from the channel.
    pub received: u64,
    /// Events whose raw copy was saved.
    pub archived: u64,
    /// Events that were also placed into a session bucket.
    pub bucketed: u64,
    /// Events the archiver rejected or could not write.
    pub failed: u64,
    pub group: u64,
    pub direct: u64,
    /// Attachment downloads that failed across all events.
    pub failed_downloads: u64,
}

/// Routes channel events to the archiver until the stream ends or shutdown
/// is requested.
pub struct IngestionDispatcher {
    channel: Box<dyn ChannelAdapter>,
    archiver: EventArchiver,
    stats: DispatchStats,
}

impl IngestionDispatcher {
    pub fn new(channel: Box<dyn ChannelAdapter>, archiver: EventArchiver) -> Self {
        Self {
            channel,
            archiver,
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    pub fn archiver(&self) -> &EventArchiver {
        &self.archiver
    }

    /// Runs the dispatch loop.
    ///
    /// 1. Connects the channel
    /// 2. Archives each received event, logging and counting failures
    /// 3. Stops on end of stream or cancellation, then shuts the channel down
    ///
    /// Only channel errors end the loop early. An event is never interrupted
    /// by cancellation once it has been received.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<DispatchStats, KeepsakeError> {
        self.channel.connect().await?;
        info!(channel = self.channel.name(), "dispatcher running");

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    break Ok(());
                }
                received = self.channel.receive() => match received {
                    Ok(Some(event)) => self.dispatch(event).await,
                    Ok(None) => {
                        info!("event stream ended");
                        break Ok(());
                    }
                    Err(e) => {
                        error!(error = %e, "channel receive error");
                        break Err(e);
                    }
                },
            }
        };

        if let Err(e) = self.channel.shutdown().await {
            warn!(error = %e, "channel shutdown error");
        }

        info!(
            received = self.stats.received,
            archived = self.stats.archived,
            bucketed = self.stats.bucketed,
            failed = self.stats.failed,
            "dispatcher stopped"
        );
        result.map(|()| self.stats.clone())
    }

    /// Routes one event by conversation kind and archives it.
    pub async fn dispatch(&mut self, event: Event) {
        self.stats.received += 1;
        match event.conversation_kind {
            ConversationKind::Group => {
                self.stats.group += 1;
                debug!(group = event.conversation_id, event = event.id, "group event");
            }
            ConversationKind::Direct => {
                self.stats.direct += 1;
                debug!(user = event.conversation_id, event = event.id, "direct event");
            }
        }

        match self.archiver.archive(&event).await {
            Ok(outcome) => self.record(&outcome),
            Err(e) => {
                self.stats.failed += 1;
                error!(
                    conversation = event.conversation_id,
                    event = event.id,
                    error = %e,
                    "failed to archive event"
                );
            }
        }
    }

    fn record(&mut self, outcome: &ArchiveOutcome) {
        self.stats.archived += 1;
        if outcome.bucket_path.is_some() {
            self.stats.bucketed += 1;
        }
        if let Some(report) = &outcome.report {
            self.stats.failed_downloads += report.failed as u64;
        }
    }
}

// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event archiving.
//!
//! Every event is saved raw below the saves root. Events whose first
//! attachment is media or a forward bundle are additionally placed in the
//! active session bucket and have their attachments resolved.

use std::path::PathBuf;
use std::sync::Arc;

use keepsake_config::KeepsakeConfig;
use keepsake_core::{Attachment, AttachmentKind, Event, Fetcher, KeepsakeError};
use tracing::{debug, info};

use crate::grouper::{Boundary, SessionGrouper};
use crate::layout::{self, Layout};
use crate::resolver::{AttachmentResolver, ResolveReport};

/// The bucket events are currently written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBucket {
    pub day: String,
    pub group: i64,
}

impl From<Boundary> for ActiveBucket {
    fn from(boundary: Boundary) -> Self {
        Self {
            day: boundary.day,
            group: boundary.group,
        }
    }
}

/// What [`EventArchiver::archive`] wrote for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    pub raw_path: PathBuf,
    /// Bucketed copy, for events whose first attachment qualifies.
    pub bucket_path: Option<PathBuf>,
    /// Whether this event opened a new bucket.
    pub opened_bucket: bool,
    /// Attachment resolution counters, when resolution ran.
    pub report: Option<ResolveReport>,
}

/// Orchestrates raw persistence, session grouping, and attachment resolution.
///
/// Holds the grouper and the active bucket, so one archiver must see every
/// event of the process in order; [`archive`](Self::archive) takes
/// `&mut self` to enforce that.
pub struct EventArchiver {
    layout: Layout,
    grouper: SessionGrouper,
    resolver: AttachmentResolver,
    active: Option<ActiveBucket>,
}

impl EventArchiver {
    pub fn new(layout: Layout, grouper: SessionGrouper, resolver: AttachmentResolver) -> Self {
        Self {
            layout,
            grouper,
            resolver,
            active: None,
        }
    }

    pub fn from_config(config: &KeepsakeConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(
            Layout::from_config(&config.archive),
            SessionGrouper::with_gap_secs(config.archive.gap_threshold_secs),
            AttachmentResolver::new(
                fetcher,
                config.archive.max_bundle_depth,
                config.fetch.max_concurrent,
            ),
        )
    }

    pub fn active_bucket(&self) -> Option<&ActiveBucket> {
        self.active.as_ref()
    }

    pub fn grouper(&self) -> &SessionGrouper {
        &self.grouper
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Archives one event.
    ///
    /// Grouper and filesystem errors propagate; failed downloads are only
    /// counted in the returned report.
    pub async fn archive(&mut self, event: &Event) -> Result<ArchiveOutcome, KeepsakeError> {
        let stamp = event.formatted_timestamp();
        let raw_path = self.layout.raw_event_path(event.conversation_id, &stamp);
        layout::write_json(&raw_path, &event.raw).await?;

        let first_kind = event.first_kind();
        info!(
            conversation = event.conversation_id,
            event = event.id,
            kind = %first_kind.map_or_else(|| "none".to_string(), |k| k.to_string()),
            path = %raw_path.display(),
            "raw event saved"
        );

        let mut outcome = ArchiveOutcome {
            raw_path,
            bucket_path: None,
            opened_bucket: false,
            report: None,
        };

        let Some(kind) = first_kind.filter(|k| k.is_archivable()) else {
            return Ok(outcome);
        };

        let boundary = self.grouper.process(&stamp, event.id)?;
        outcome.opened_bucket = boundary.is_some();
        let active = self.adopt(boundary)?;
        info!(
            conversation = event.conversation_id,
            event = event.id,
            day = %active.day,
            group = active.group,
            new = outcome.opened_bucket,
            "session bucket"
        );

        let bucket_path = self
            .layout
            .bucket_event_path(&active.day, active.group, event.id);
        layout::write_json(&bucket_path, &event.raw).await?;
        info!(
            conversation = event.conversation_id,
            event = event.id,
            path = %bucket_path.display(),
            "bucketed event saved"
        );
        outcome.bucket_path = Some(bucket_path);

        let day_dir = self.layout.day_dir(&active.day);
        outcome.report = match (kind, event.attachments.first()) {
            (AttachmentKind::Forward, Some(Attachment::Forward(bundle))) => Some(
                self.resolver
                    .resolve(&event.attachments, bundle.id.as_str(), &day_dir)
                    .await?,
            ),
            (AttachmentKind::Image | AttachmentKind::Video, _) => Some(
                self.resolver
                    .resolve(&event.attachments, &active.group.to_string(), &day_dir)
                    .await?,
            ),
            _ => {
                debug!(event = event.id, %kind, "no attachment resolution for kind");
                None
            }
        };

        if let Some(report) = &outcome.report {
            info!(
                event = event.id,
                downloaded = report.downloaded,
                failed = report.failed,
                snapshots = report.snapshots,
                undownloaded = report.undownloaded,
                pruned = report.pruned,
                "attachments resolved"
            );
        }

        Ok(outcome)
    }

    /// Updates the active bucket from a grouper decision.
    ///
    /// A boundary always replaces the active bucket. Without a boundary the
    /// active bucket is kept, or taken over from the grouper when none has
    /// been adopted yet.
    fn adopt(&mut self, boundary: Option<Boundary>) -> Result<ActiveBucket, KeepsakeError> {
        if let Some(boundary) = boundary {
            self.active = Some(boundary.into());
        } else if self.active.is_none() {
            let bucket = self.grouper.current_bucket().ok_or_else(|| {
                KeepsakeError::Internal("grouper merged an event without a bucket".into())
            })?;
            self.active = Some(ActiveBucket {
                day: bucket.day_label(),
                group: bucket.group,
            });
        }

        self.active
            .clone()
            .ok_or_else(|| KeepsakeError::Internal("no active bucket".into()))
    }
}

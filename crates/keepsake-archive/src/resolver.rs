// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recursive attachment resolution.
//!
//! An event's attachment list is flattened into per-container output
//! directories below a day directory. Forward bundles get their own
//! directory and a JSON snapshot; images and videos are downloaded into
//! the directory of the container they appear in.
//!
//! Resolution runs in two phases. [`AttachmentResolver::plan`] walks the
//! attachment tree without touching the filesystem and returns a
//! [`ResolvePlan`]; [`AttachmentResolver::execute`] writes the snapshots
//! and then runs the downloads concurrently.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use keepsake_core::{Attachment, AttachmentKind, Bundle, BundleId, Fetcher, KeepsakeError, Media};
use tracing::{debug, warn};

use crate::layout::{self, container_dir, path_component, snapshot_path};

/// Default bound on forward-bundle nesting.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// A bundle snapshot to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotJob {
    pub bundle_id: BundleId,
    pub path: PathBuf,
    pub raw: serde_json::Value,
}

/// A media payload to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub kind: AttachmentKind,
    pub url: String,
    pub destination: PathBuf,
}

/// Counters describing one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Downloads that completed.
    pub downloaded: usize,
    /// Downloads that failed and were written to the error log.
    pub failed: usize,
    /// Bundle snapshots written.
    pub snapshots: usize,
    /// Audio and file attachments, detected but not downloaded.
    pub undownloaded: usize,
    /// Image or video attachments without a URL.
    pub missing_url: usize,
    /// Bundles not entered because of the depth bound or a repeated id.
    pub pruned: usize,
}

/// Everything a resolution will write, computed up front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvePlan {
    pub snapshots: Vec<SnapshotJob>,
    pub downloads: Vec<DownloadJob>,
    pub report: ResolveReport,
}

/// Walks attachment trees and dispatches downloads to a [`Fetcher`].
pub struct AttachmentResolver {
    fetcher: Arc<dyn Fetcher>,
    max_depth: usize,
    max_concurrent: usize,
}

impl AttachmentResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, max_depth: usize, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_depth,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolves `attachments` found in `container`, writing below `day_dir`.
    ///
    /// Snapshot write failures propagate. Download failures are counted in
    /// the report and never abort the resolution.
    pub async fn resolve(
        &self,
        attachments: &[Attachment],
        container: &str,
        day_dir: &Path,
    ) -> Result<ResolveReport, KeepsakeError> {
        let plan = self.plan(attachments, container, day_dir);
        self.execute(plan).await
    }

    /// Computes snapshots and downloads without performing any I/O.
    pub fn plan(&self, attachments: &[Attachment], container: &str, day_dir: &Path) -> ResolvePlan {
        let mut walk = Walk {
            day_dir,
            max_depth: self.max_depth,
            seen: HashSet::new(),
            destinations: HashSet::new(),
            plan: ResolvePlan::default(),
        };
        walk.attachments(attachments, container, 0);
        walk.plan
    }

    /// Writes the planned snapshots, then runs the planned downloads.
    pub async fn execute(&self, plan: ResolvePlan) -> Result<ResolveReport, KeepsakeError> {
        let mut report = plan.report;

        for snapshot in &plan.snapshots {
            layout::write_json(&snapshot.path, &snapshot.raw).await?;
            debug!(bundle = %snapshot.bundle_id, path = %snapshot.path.display(), "bundle snapshot saved");
            report.snapshots += 1;
        }

        let fetcher = &self.fetcher;
        let outcomes: Vec<bool> = futures::stream::iter(plan.downloads.iter())
            .map(|job| async move {
                debug!(kind = %job.kind, url = %job.url, path = %job.destination.display(), "downloading");
                fetcher.fetch(&job.url, &job.destination).await.is_ok()
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        report.downloaded = outcomes.iter().filter(|ok| **ok).count();
        report.failed = outcomes.len() - report.downloaded;
        Ok(report)
    }
}

struct Walk<'a> {
    day_dir: &'a Path,
    max_depth: usize,
    seen: HashSet<BundleId>,
    destinations: HashSet<PathBuf>,
    plan: ResolvePlan,
}

impl Walk<'_> {
    fn attachments(&mut self, attachments: &[Attachment], container: &str, depth: usize) {
        for attachment in attachments {
            match attachment {
                Attachment::Forward(bundle) => self.bundle(bundle, depth),
                Attachment::Image(media) => self.media(AttachmentKind::Image, media, container),
                Attachment::Video(media) => self.media(AttachmentKind::Video, media, container),
                Attachment::Audio(media) | Attachment::File(media) => {
                    debug!(kind = %attachment.kind(), file = %media.file, "no download path for attachment kind");
                    self.plan.report.undownloaded += 1;
                }
                Attachment::Other { .. } => {}
            }
        }
    }

    fn bundle(&mut self, bundle: &Bundle, depth: usize) {
        if depth >= self.max_depth {
            warn!(bundle = %bundle.id, depth, max_depth = self.max_depth, "bundle nesting too deep, not entering");
            self.plan.report.pruned += 1;
            return;
        }
        if !self.seen.insert(bundle.id.clone()) {
            warn!(bundle = %bundle.id, "bundle already visited in this tree, not entering again");
            self.plan.report.pruned += 1;
            return;
        }

        self.plan.snapshots.push(SnapshotJob {
            bundle_id: bundle.id.clone(),
            path: snapshot_path(self.day_dir, bundle.id.as_str()),
            raw: bundle.raw.clone(),
        });

        for message in &bundle.messages {
            self.attachments(&message.attachments, bundle.id.as_str(), depth + 1);
        }
    }

    fn media(&mut self, kind: AttachmentKind, media: &Media, container: &str) {
        let Some(url) = media.url.as_deref() else {
            warn!(%kind, file = %media.file, "media attachment has no url");
            self.plan.report.missing_url += 1;
            return;
        };

        let destination = container_dir(self.day_dir, container).join(path_component(&media.file));
        if !self.destinations.insert(destination.clone()) {
            debug!(path = %destination.display(), "duplicate download skipped");
            return;
        }

        self.plan.downloads.push(DownloadJob {
            kind,
            url: url.to_string(),
            destination,
        });
    }
}

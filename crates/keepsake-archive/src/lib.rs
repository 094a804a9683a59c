// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event archiving for Keepsake.
//!
//! - [`SessionGrouper`] splits the event timeline into session buckets.
//! - [`AttachmentResolver`] flattens nested forward bundles and downloads media.
//! - [`EventArchiver`] ties both together for each incoming event.

pub mod archiver;
pub mod grouper;
pub mod layout;
pub mod resolver;

pub use archiver::{ActiveBucket, ArchiveOutcome, EventArchiver};
pub use grouper::{Boundary, Bucket, SessionGrouper};
pub use layout::Layout;
pub use resolver::{AttachmentResolver, ResolvePlan, ResolveReport};

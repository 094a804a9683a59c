// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keepsake chat archiver.
//!
//! This crate provides the normalized event model, the error taxonomy, and
//! the adapter traits used throughout the Keepsake workspace.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{FetchError, GrouperError, KeepsakeError};
pub use types::{
    AdapterType, Attachment, AttachmentKind, Bundle, BundleId, ConversationKind, Event,
    ForwardedMessage, HealthStatus, Media,
};

pub use traits::{ChannelAdapter, Fetcher, PluginAdapter};

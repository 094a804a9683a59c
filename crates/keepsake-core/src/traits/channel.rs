// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for host messaging runtimes.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Event;

/// Source of normalized chat events.
///
/// A channel owns the host connection and converts each host payload into
/// an [`Event`] before handing it out.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes the connection to the host runtime.
    async fn connect(&mut self) -> Result<(), KeepsakeError>;

    /// Receives the next event, or `None` once the host stream has ended.
    async fn receive(&self) -> Result<Option<Event>, KeepsakeError>;
}

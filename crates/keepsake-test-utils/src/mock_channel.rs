// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter replaying a fixed event list.

use std::collections::VecDeque;

use async_trait::async_trait;
use keepsake_core::types::{AdapterType, HealthStatus};
use keepsake_core::{ChannelAdapter, Event, KeepsakeError, PluginAdapter};
use tokio::sync::Mutex;

/// A channel that hands out queued events, then reports end of stream.
pub struct MockChannel {
    inbound: Mutex<VecDeque<Event>>,
}

impl MockChannel {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            inbound: Mutex::new(events.into_iter().collect()),
        }
    }

    /// Queues another event behind the ones already waiting.
    pub async fn inject(&self, event: Event) {
        self.inbound.lock().await.push_back(event);
    }

    pub async fn remaining(&self) -> usize {
        self.inbound.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KeepsakeError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), KeepsakeError> {
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Event>, KeepsakeError> {
        Ok(self.inbound.lock().await.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::EventBuilder;

    #[tokio::test]
    async fn injected_events_queue_behind_initial_ones() {
        let channel = MockChannel::new([EventBuilder::group(1, 10).build()]);
        channel.inject(EventBuilder::group(1, 11).build()).await;
        assert_eq!(channel.remaining().await, 2);

        assert_eq!(channel.receive().await.unwrap().unwrap().id, 10);
        assert_eq!(channel.receive().await.unwrap().unwrap().id, 11);
        assert!(channel.receive().await.unwrap().is_none());
        assert_eq!(channel.remaining().await, 0);
    }
}

// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keepsake integration tests.
//!
//! Provides mock adapters and event builders for fast, deterministic tests
//! without a network or a host runtime.
//!
//! # Components
//!
//! - [`MockFetcher`] - Fetcher that records calls and writes a fixed payload
//! - [`MockChannel`] - Channel replaying a fixed list of events
//! - [`EventBuilder`] - Builds normalized events with matching raw host JSON

pub mod builders;
pub mod mock_channel;
pub mod mock_fetcher;

pub use builders::{EventBuilder, audio, file, forward, image, video};
pub use mock_channel::MockChannel;
pub use mock_fetcher::{FetchCall, MockFetcher};

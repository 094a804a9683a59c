// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keepsake serve` and `keepsake archive` implementations.
//!
//! Both wire the HTTP fetcher, the event archiver, and the OneBot channel
//! into an [`IngestionDispatcher`]; they differ only in where events come
//! from.

use std::sync::Arc;

use keepsake_agent::{DispatchStats, IngestionDispatcher, shutdown};
use keepsake_archive::EventArchiver;
use keepsake_config::KeepsakeConfig;
use keepsake_core::KeepsakeError;
use keepsake_fetch::HttpFetcher;
use keepsake_onebot::OneBotChannel;
use tracing::{info, warn};

/// Runs the dispatcher over the configured input until it ends or a
/// shutdown signal arrives.
pub async fn run_serve(config: KeepsakeConfig) -> Result<(), KeepsakeError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, input = %config.onebot.input, "starting keepsake");

    let cancel = shutdown::install_signal_handler();
    let stats = dispatch(&config, cancel.clone()).await;
    cancel.cancel();
    report(&stats?);
    Ok(())
}

/// Archives a finite capture file and exits.
pub async fn run_archive(config: KeepsakeConfig) -> Result<(), KeepsakeError> {
    init_tracing(&config.agent.log_level);
    info!(file = %config.onebot.input, "archiving capture file");

    let cancel = shutdown::install_signal_handler();
    let stats = dispatch(&config, cancel.clone()).await;
    cancel.cancel();
    let stats = stats?;
    report(&stats);
    if stats.failed > 0 {
        warn!(failed = stats.failed, "some events could not be archived");
    }
    Ok(())
}

async fn dispatch(
    config: &KeepsakeConfig,
    cancel: tokio_util::sync::CancellationToken,
) -> Result<DispatchStats, KeepsakeError> {
    let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
    let archiver = EventArchiver::from_config(config, fetcher);
    let channel = OneBotChannel::open(&config.onebot).await?;
    let mut dispatcher = IngestionDispatcher::new(Box::new(channel), archiver);
    dispatcher.run(cancel).await
}

fn report(stats: &DispatchStats) {
    info!(
        received = stats.received,
        archived = stats.archived,
        bucketed = stats.bucketed,
        failed = stats.failed,
        failed_downloads = stats.failed_downloads,
        group = stats.group,
        direct = stats.direct,
        "keepsake finished"
    );
}

/// Initializes the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins over the configured level. Safe to call more than once.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keepsake={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}

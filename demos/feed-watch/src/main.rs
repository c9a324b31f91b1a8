//! Terminal watcher for a live event feed.
//!
//! Run with: cargo run -p feed-watch
//!
//! Point it at a backend with `FEED_SYNC_API_BASE` and pass an existing
//! session with `FEED_SYNC_SESSION_COOKIE` (e.g. `session=...`).

use std::sync::Arc;

use anyhow::Context;
use feed_sync_core::{ClientConfig, FeedStore, Navigator};
use feed_sync_session::{SessionGate, Verdict, navigation::MemoryNavigator};
use feed_sync_transport::{Dispatch, HttpApi, LiveFeed, SseTransport, StreamClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ClientConfig::from_env().context("Invalid FEED_SYNC_* configuration")?;
    tracing::info!(api_base = %config.api_base, "Starting feed watcher");

    let api = Arc::new(HttpApi::new(config.clone()).context("Failed to build HTTP client")?);
    let navigator = Arc::new(MemoryNavigator::new("/"));
    let session = Arc::new(SessionGate::new(
        api.clone(),
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    ));
    let feed = Arc::new(FeedStore::new(api.clone(), config.per_page));
    let stream = StreamClient::with_config(SseTransport::from_api(&api), &config);

    let mut live = LiveFeed::new(
        session,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        Arc::clone(&feed),
        stream,
    );

    if let Verdict::Redirect(to) = live.start().await {
        tracing::warn!(redirect = %to, "Not signed in");
        live.session().login();
        if let Some(url) = navigator.last_redirect() {
            tracing::info!(%url, "Sign in through the browser, then set FEED_SYNC_SESSION_COOKIE");
        }
        return Ok(());
    }

    let state = feed.snapshot();
    if let Some(ref error) = state.error {
        tracing::warn!(%error, "Initial page failed to load");
    }
    for item in &state.page.items {
        tracing::info!(id = item.id, kind = %item.event_type, repo = %item.repo_name, "Event");
    }
    tracing::info!(
        total = state.page.pagination.total,
        pages = state.page.pagination.total_pages,
        "Feed loaded, waiting for new events"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            dispatch = live.step() => match dispatch {
                Some(Dispatch::Item { id, accepted: true }) => {
                    if let Some(item) = feed.snapshot().page.items.first() {
                        tracing::info!(id, kind = %item.event_type, repo = %item.repo_name, "New event");
                    }
                }
                Some(Dispatch::Item { id, accepted: false }) => {
                    tracing::debug!(id, "Pushed event skipped");
                }
                Some(Dispatch::SessionExpired(verdict)) => {
                    tracing::warn!(?verdict, "Session expired");
                    break;
                }
                Some(Dispatch::Reconnected) => {
                    tracing::info!(total = feed.snapshot().page.pagination.total, "Reconnected");
                }
                None => break,
            },
        }
    }

    live.shutdown();
    Ok(())
}

//! Facade poller — one request chain per tick, sequenced.
//!
//! The loop never overlaps requests: the next tick waits for the previous
//! poll to resolve. A `()` on the force channel (the `r` key) cuts the sleep
//! short.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use kiosk_proto::model::{PlaybackSnapshot, PlayingContext, RecentlyPlayed};

use crate::app::AppMessage;

pub struct Poller {
    http: reqwest::Client,
    base_url: String,
    /// Set once any poll carried track metadata; gates the history fallback.
    seen_track: bool,
}

/// The history endpoint is only worth asking while nothing has been rendered
/// yet; afterwards the sticky last-known track covers quiet periods.
fn needs_history_fallback(snapshot: &PlaybackSnapshot, seen_track: bool) -> bool {
    !snapshot.has_track() && !seen_track
}

impl Poller {
    pub fn new(server_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            base_url: server_url.trim_end_matches('/').to_string(),
            seen_track: false,
        }
    }

    async fn fetch_current(&self) -> anyhow::Result<Option<PlayingContext>> {
        let response = self
            .http
            .get(format!("{}/api/currently-playing", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("facade returned {}", response.status());
        }
        // The facade answers `null` when the provider had no content.
        Ok(response.json().await?)
    }

    async fn fetch_recent(&self) -> anyhow::Result<RecentlyPlayed> {
        let response = self
            .http
            .get(format!("{}/api/recently-played", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("facade returned {}", response.status());
        }
        Ok(response.json().await?)
    }

    pub async fn poll(&mut self) -> anyhow::Result<PlaybackSnapshot> {
        let mut snapshot = PlaybackSnapshot::from_current(self.fetch_current().await?);

        if needs_history_fallback(&snapshot, self.seen_track) {
            debug!("nothing playing and nothing remembered, asking history");
            match self.fetch_recent().await {
                Ok(recent) => snapshot = PlaybackSnapshot::from_recent(recent),
                Err(e) => warn!("recently-played fallback failed: {e:#}"),
            }
        }

        if snapshot.has_track() {
            self.seen_track = true;
        }
        Ok(snapshot)
    }
}

/// Spawn the poll loop. The first poll fires immediately. Returns the force
/// channel used to cut the inter-poll sleep short.
pub fn spawn(
    server_url: String,
    interval: Duration,
    tx: mpsc::Sender<AppMessage>,
) -> (mpsc::Sender<()>, JoinHandle<()>) {
    let (force_tx, mut force_rx) = mpsc::channel::<()>(1);

    let handle = tokio::spawn(async move {
        let mut poller = Poller::new(&server_url);
        loop {
            let update = match poller.poll().await {
                Ok(snapshot) => AppMessage::Snapshot(snapshot),
                Err(e) => {
                    warn!("poll failed: {e:#}");
                    AppMessage::PollFailed(e.to_string())
                }
            };
            if tx.send(update).await.is_err() {
                return; // app is gone
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                nudge = force_rx.recv() => {
                    if nudge.is_none() {
                        return;
                    }
                }
            }
        }
    });

    (force_tx, handle)
}

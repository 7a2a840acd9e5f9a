//! Upstream proxy — read-only playback queries against the provider API.
//!
//! Two calls are exposed: currently-playing and recently-played (limit 1).
//! A 204 means "nothing playing" and maps to `None` without touching the
//! body. A 401 invalidates the cached credential and the request is retried
//! exactly once with a fresh token; a second 401 is fatal for that call.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;

use kiosk_proto::config::SpotifyConfig;
use kiosk_proto::model::{PlayingContext, RecentlyPlayed};

use crate::token::TokenCache;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    #[error("token exchange rejected ({0})")]
    Auth(StatusCode),
    #[error("upstream API error ({0})")]
    Upstream(StatusCode),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct SpotifyClient {
    http: reqwest::Client,
    tokens: TokenCache,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self {
            http: http.clone(),
            tokens: TokenCache::new(http, config.clone()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Current access token, for the diagnostic facade route.
    pub async fn token(&self) -> Result<String, SpotifyError> {
        self.tokens.bearer().await
    }

    pub async fn currently_playing(&self) -> Result<Option<PlayingContext>, SpotifyError> {
        self.get_json("/v1/me/player/currently-playing").await
    }

    pub async fn recently_played(&self) -> Result<RecentlyPlayed, SpotifyError> {
        let recent = self.get_json("/v1/me/player/recently-played?limit=1").await?;
        // An empty history answers 204 on some accounts; treat it as no items.
        Ok(recent.unwrap_or(RecentlyPlayed { items: Vec::new() }))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SpotifyError> {
        let url = format!("{}{}", self.api_base, path);
        let mut token = self.tokens.bearer().await?;
        let mut retried = false;

        loop {
            let response = self.http.get(&url).bearer_auth(&token).send().await?;
            match response.status() {
                StatusCode::NO_CONTENT => return Ok(None),
                StatusCode::UNAUTHORIZED if !retried => {
                    warn!("upstream rejected the access token, refreshing once");
                    self.tokens.invalidate().await;
                    token = self.tokens.bearer().await?;
                    retried = true;
                }
                status if status.is_success() => return Ok(Some(response.json().await?)),
                status => return Err(SpotifyError::Upstream(status)),
            }
        }
    }
}

//! In-memory bearer credential cache.
//!
//! Holds a single access token and its expiry. `bearer()` returns the cached
//! token while it is still valid and otherwise performs one refresh-grant
//! exchange against the provider's token endpoint. The slot sits behind an
//! async mutex that is held across the exchange, so concurrent callers hitting
//! an expired slot coalesce onto a single exchange.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use kiosk_proto::config::SpotifyConfig;

use crate::spotify::SpotifyError;

/// The provider reports a lifetime of ~60 minutes; expire well before that.
const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(600);
const MIN_LIFETIME: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct Credential {
    access_token: String,
    expires_at: Instant,
}

pub struct TokenCache {
    http: reqwest::Client,
    auth: SpotifyConfig,
    slot: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(http: reqwest::Client, auth: SpotifyConfig) -> Self {
        Self {
            http,
            auth,
            slot: Mutex::new(None),
        }
    }

    /// A valid bearer token, refreshed on demand.
    pub async fn bearer(&self) -> Result<String, SpotifyError> {
        let mut slot = self.slot.lock().await;
        // Re-check under the lock: another caller may have refreshed while we
        // waited for it.
        if let Some(cred) = slot.as_ref() {
            if Instant::now() < cred.expires_at {
                return Ok(cred.access_token.clone());
            }
        }

        let cred = self.exchange().await?;
        let token = cred.access_token.clone();
        *slot = Some(cred);
        Ok(token)
    }

    /// Drop the cached credential so the next `bearer()` call exchanges anew.
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }

    async fn exchange(&self) -> Result<Credential, SpotifyError> {
        debug!("exchanging refresh token at {}", self.auth.token_url);

        let response = self
            .http
            .post(&self.auth.token_url)
            .basic_auth(&self.auth.client_id, Some(&self.auth.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.auth.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Auth(status));
        }

        let body: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(body.expires_in)
            .saturating_sub(EXPIRY_SAFETY_MARGIN)
            .max(MIN_LIFETIME);
        info!("access token refreshed, usable for {}s", lifetime.as_secs());

        Ok(Credential {
            access_token: body.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

use std::sync::Arc;

use tracing::{info, warn};

use kiosk_proto::config::Config;
use kiosk_server::http;
use kiosk_server::spotify::SpotifyClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,kiosk_server=debug")),
        )
        .init();

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    if !config.has_credentials() {
        warn!(
            "Spotify credentials not configured; set SPOTIFY_CLIENT_ID, \
             SPOTIFY_CLIENT_SECRET and SPOTIFY_REFRESH_TOKEN"
        );
    }

    let spotify = Arc::new(SpotifyClient::new(&config.spotify));

    let server = http::start_server(config.http.bind_address.clone(), config.http.port, spotify);
    server.await?;

    Ok(())
}

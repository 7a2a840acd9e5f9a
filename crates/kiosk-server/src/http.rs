//! Local API facade for the display client.
//!
//! Three unauthenticated JSON routes, CORS-open. Access control is network
//! placement: the facade binds to a trusted interface. Each route isolates
//! its own upstream failure as a 500 with an error body; a failing provider
//! never takes the serving process down.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use kiosk_proto::model::{PlayingContext, RecentlyPlayed};

use crate::spotify::{SpotifyClient, SpotifyError};

#[derive(Clone)]
struct ApiState {
    spotify: Arc<SpotifyClient>,
}

#[derive(Serialize)]
struct TokenBody {
    access_token: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn internal_error(err: SpotifyError) -> ApiError {
    error!("upstream request failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

pub fn router(spotify: Arc<SpotifyClient>) -> Router {
    Router::new()
        .route("/api/token", get(get_token))
        .route("/api/currently-playing", get(get_currently_playing))
        .route("/api/recently-played", get(get_recently_played))
        .layer(CorsLayer::permissive())
        .with_state(ApiState { spotify })
}

async fn get_token(State(state): State<ApiState>) -> Result<Json<TokenBody>, ApiError> {
    let access_token = state.spotify.token().await.map_err(internal_error)?;
    Ok(Json(TokenBody { access_token }))
}

/// `null` when the provider answered 204 — the client reads that as "nothing
/// playing" and decides on its history fallback itself.
async fn get_currently_playing(
    State(state): State<ApiState>,
) -> Result<Json<Option<PlayingContext>>, ApiError> {
    let current = state
        .spotify
        .currently_playing()
        .await
        .map_err(internal_error)?;
    Ok(Json(current))
}

async fn get_recently_played(
    State(state): State<ApiState>,
) -> Result<Json<RecentlyPlayed>, ApiError> {
    let recent = state
        .spotify
        .recently_played()
        .await
        .map_err(internal_error)?;
    Ok(Json(recent))
}

pub fn start_server(
    bind_address: String,
    port: u16,
    spotify: Arc<SpotifyClient>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(spotify);
        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind kiosk API to {}: {}", addr, e);
                return;
            }
        };

        info!("Kiosk API listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

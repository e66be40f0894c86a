//! HTTP surface of the engine.
//!
//! Players open one WebSocket per attempt; the two JSON endpoints exist for
//! health checks and for the lobby's challenge preview. Anything else is the
//! player SPA.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

const STATIC_DIR: &str = "./static";

pub fn build_router(state: Arc<AppState>) -> Router {
    // Unknown paths fall back to `index.html` so client-side routes survive a reload.
    let player_spa = ServeDir::new(STATIC_DIR)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{STATIC_DIR}/index.html")));

    Router::new()
        .route("/ws/:challenge_id", get(ws::ws_upgrade))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(player_cors())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(player_spa)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(http::http_health))
        .route("/challenges/:challenge_id", get(http::http_get_challenge))
}

/// The SPA may be hosted on another origin than the engine.
fn player_cors() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

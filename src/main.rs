//! Challenge Engine · challenge session host
//!
//! - Axum HTTP + WebSocket API (one WebSocket per attempt)
//! - REST backend client for challenge detail and attempt submission
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   BACKEND_BASE_URL     : REST backend root (default "http://localhost:8000/api")
//!   BACKEND_TIMEOUT_SECS : per-request timeout (default 15)
//!   ENGINE_CONFIG_PATH   : path to TOML config (backend + session knobs)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use challenge_engine::config::EngineConfig;
use challenge_engine::routes::build_router;
use challenge_engine::state::AppState;
use challenge_engine::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = EngineConfig::load_from_env();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));

  let state = Arc::new(AppState::new(config)?);
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "challenge_engine", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "challenge_engine", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "challenge_engine", error = %e, "Cannot listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "challenge_engine", "Shutdown signal received");
}

//! Application state shared by every connection: configuration and the backend client.
//!
//! Sessions themselves are not stored here. Each one is owned by the WebSocket
//! task that created it and dies with that connection.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::backend::{BackendError, ChallengeBackend, HttpBackend};
use crate::config::EngineConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EngineConfig,
    pub backend: Arc<dyn ChallengeBackend>,
}

impl AppState {
    /// Build state from config: the reqwest-backed client talks to `backend.base_url`.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: EngineConfig) -> Result<Self, BackendError> {
        let http = HttpBackend::new(&config.backend)?;
        info!(
            target: "challenge_engine",
            base_url = %http.base_url,
            timeout_secs = config.backend.timeout_secs,
            budget_secs = config.session.time_budget_secs,
            "Backend client ready"
        );
        Ok(Self::with_backend(config, Arc::new(http)))
    }

    pub fn with_backend(config: EngineConfig, backend: Arc<dyn ChallengeBackend>) -> Self {
        Self { config, backend }
    }
}

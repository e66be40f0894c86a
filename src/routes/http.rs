//! HTTP endpoint handlers. Thin wrappers; attempts themselves only run over WebSocket.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument, warn};

use crate::backend::BackendError;
use crate::protocol::{to_out, ErrorOut, HealthOut};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

/// Preview of a challenge (title, items, no answers) for the lobby screen.
#[instrument(level = "info", skip(state), fields(%challenge_id))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Path(challenge_id): Path<String>,
) -> impl IntoResponse {
  match state.backend.fetch_challenge(&challenge_id).await {
    Ok(detail) => {
      info!(target: "challenge_engine", id = %detail.id, kind = %detail.kind(), "HTTP challenge preview served");
      Json(to_out(&detail, state.config.session.puzzle_grid)).into_response()
    }
    Err(e) => {
      warn!(target: "challenge_engine", %challenge_id, error = %e, "Challenge preview unavailable");
      let status = match e {
        BackendError::ChallengeId(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
      };
      (status, Json(ErrorOut { message: e.to_string() })).into_response()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use axum::body::{to_bytes, Body};
  use axum::http::Request;
  use tower::ServiceExt;

  use crate::backend::ChallengeBackend;
  use crate::config::EngineConfig;
  use crate::domain::{ChallengeContent, ChallengeDetail, OrderingItem};
  use crate::protocol::SubmissionPayload;
  use crate::routes::build_router;

  struct OneChallenge;

  #[async_trait]
  impl ChallengeBackend for OneChallenge {
    async fn fetch_challenge(&self, challenge_id: &str) -> Result<ChallengeDetail, BackendError> {
      if challenge_id == ".." {
        return Err(BackendError::ChallengeId(challenge_id.to_string()));
      }
      if challenge_id != "t1" {
        return Err(BackendError::Unavailable(format!("unknown challenge {challenge_id}")));
      }
      Ok(ChallengeDetail {
        id: "t1".into(),
        title: "Dynasties".into(),
        content: ChallengeContent::Ordering {
          items: vec![OrderingItem { id: 1, content: "Tang".into(), correct_order: 2 }],
        },
      })
    }

    async fn submit_attempt(&self, _id: &str, _payload: &SubmissionPayload) -> Result<u32, BackendError> {
      Ok(0)
    }
  }

  fn app() -> axum::Router {
    build_router(Arc::new(AppState::with_backend(EngineConfig::default(), Arc::new(OneChallenge))))
  }

  async fn get(uri: &str) -> (StatusCode, String) {
    let res = app()
      .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
      .await
      .expect("response");
    let status = res.status();
    let body = to_bytes(res.into_body(), 64 * 1024).await.expect("body");
    (status, String::from_utf8_lossy(&body).into_owned())
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, body) = get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
  }

  #[tokio::test]
  async fn preview_strips_correct_order() {
    let (status, body) = get("/api/v1/challenges/t1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"type\":\"ordering\""));
    assert!(body.contains("Tang"));
    assert!(!body.contains("correct_order"));
  }

  #[tokio::test]
  async fn preview_reports_backend_failure() {
    let (status, body) = get("/api/v1/challenges/missing").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("unknown challenge missing"));
  }

  #[tokio::test]
  async fn malformed_challenge_id_is_a_client_error() {
    let (status, _) = get("/api/v1/challenges/%2E%2E").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}

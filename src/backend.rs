//! REST backend client: challenge detail in, attempt submission out.
//!
//! Calls are instrumented and log status codes and latencies, never payloads.
//! Every request is bounded by the configured timeout; nothing is retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Url;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::BackendConfig;
use crate::domain::ChallengeDetail;
use crate::protocol::{SubmissionPayload, SubmitRequest, SubmitResponse};

const UA: &str = concat!("challenge-engine/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum BackendError {
  #[error("backend request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("backend answered HTTP {status}: {body}")]
  Status { status: reqwest::StatusCode, body: String },
  #[error("backend unavailable: {0}")]
  Unavailable(String),
  #[error("invalid backend base url {url:?}: {reason}")]
  BaseUrl { url: String, reason: String },
  #[error("invalid challenge id {0:?}")]
  ChallengeId(String),
}

/// The two calls the session engine makes against the REST backend.
#[async_trait]
pub trait ChallengeBackend: Send + Sync {
  async fn fetch_challenge(&self, challenge_id: &str) -> Result<ChallengeDetail, BackendError>;

  /// Returns the authoritative score.
  async fn submit_attempt(&self, challenge_id: &str, payload: &SubmissionPayload) -> Result<u32, BackendError>;
}

#[derive(Clone)]
pub struct HttpBackend {
  client: reqwest::Client,
  pub base_url: Url,
}

impl HttpBackend {
  pub fn new(cfg: &BackendConfig) -> Result<Self, BackendError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
      .build()?;
    let base_url = Url::parse(&cfg.base_url)
      .map_err(|e| BackendError::BaseUrl { url: cfg.base_url.clone(), reason: e.to_string() })?;
    if base_url.cannot_be_a_base() {
      return Err(BackendError::BaseUrl { url: cfg.base_url.clone(), reason: "not a hierarchical URL".into() });
    }
    Ok(Self { client, base_url })
  }

  /// `{base}/challenges/{id}[/{tail}]`. The id is pushed as a single escaped
  /// path segment, so `/`, `?` and `#` in it never leave that segment.
  fn challenge_url(&self, challenge_id: &str, tail: Option<&str>) -> Result<Url, BackendError> {
    if matches!(challenge_id, "" | "." | "..") {
      return Err(BackendError::ChallengeId(challenge_id.to_string()));
    }
    let mut url = self.base_url.clone();
    {
      let mut segments = url
        .path_segments_mut()
        .map_err(|()| BackendError::BaseUrl { url: self.base_url.to_string(), reason: "not a hierarchical URL".into() })?;
      segments.pop_if_empty().push("challenges").push(challenge_id);
      if let Some(tail) = tail {
        segments.push(tail);
      }
    }
    Ok(url)
  }

  async fn check(res: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = res.status();
    if status.is_success() {
      return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(BackendError::Status { status, body: trunc_for_log(&body, 200) })
  }
}

#[async_trait]
impl ChallengeBackend for HttpBackend {
  #[instrument(level = "info", skip(self), fields(%challenge_id))]
  async fn fetch_challenge(&self, challenge_id: &str) -> Result<ChallengeDetail, BackendError> {
    let started = Instant::now();
    let res = self
      .client
      .get(self.challenge_url(challenge_id, None)?)
      .header(USER_AGENT, UA)
      .header(ACCEPT, "application/json")
      .send()
      .await?;
    let res = Self::check(res).await?;
    let detail: ChallengeDetail = res.json().await?;
    info!(
      target: "challenge_engine",
      kind = %detail.kind(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "Challenge detail fetched"
    );
    Ok(detail)
  }

  #[instrument(level = "info", skip(self, payload), fields(%challenge_id))]
  async fn submit_attempt(&self, challenge_id: &str, payload: &SubmissionPayload) -> Result<u32, BackendError> {
    let started = Instant::now();
    let body = SubmitRequest { challenge_id, payload };
    let res = self
      .client
      .post(self.challenge_url(challenge_id, Some("submit"))?)
      .header(USER_AGENT, UA)
      .header(CONTENT_TYPE, "application/json")
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          warn!(target: "challenge_engine", %challenge_id, "Submission timed out");
        }
        BackendError::from(e)
      })?;
    let res = Self::check(res).await?;
    let out: SubmitResponse = res.json().await?;
    let score = out.score_u32();
    info!(
      target: "challenge_engine",
      score,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "Attempt submitted"
    );
    Ok(score)
  }
}

/// Log-safe truncation for backend error bodies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

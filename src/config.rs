//! Loading engine configuration from TOML, with a few env overrides.
//!
//! See `EngineConfig`, `BackendConfig` and `SessionConfig` for the expected schema.
//! Every field has a default, so an empty file (or no file at all) is valid.

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("cannot read config file {path}: {source}")]
  Read { path: String, source: std::io::Error },
  #[error("invalid TOML config: {0}")]
  Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
  #[serde(default)]
  pub port: Option<u16>,
  #[serde(default)]
  pub backend: BackendConfig,
  #[serde(default)]
  pub session: SessionConfig,
}

/// Where the REST backend lives and how long we wait for it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
  pub base_url: String,
  /// Upper bound for a single backend request. A submission that times out
  /// counts as a failed submission; there is no automatic retry.
  pub timeout_secs: u64,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self { base_url: "http://localhost:8000/api".into(), timeout_secs: 15 }
  }
}

/// Knobs shared by every attempt.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
  pub time_budget_secs: u32,
  pub puzzle_grid: usize,
  pub puzzle_shuffle_moves: usize,
  pub shuffle_ordering: bool,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      time_budget_secs: 180,
      puzzle_grid: 3,
      puzzle_shuffle_moves: 120,
      shuffle_ordering: true,
    }
  }
}

impl EngineConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str::<EngineConfig>(s)?)
  }

  pub fn from_file(path: &str) -> Result<Self, ConfigError> {
    let s = std::fs::read_to_string(path)
      .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
    Self::from_toml_str(&s)
  }

  /// Read ENGINE_CONFIG_PATH (if set), then apply PORT / BACKEND_BASE_URL /
  /// BACKEND_TIMEOUT_SECS. A broken file is logged and replaced by defaults.
  pub fn load_from_env() -> Self {
    let mut cfg = match std::env::var("ENGINE_CONFIG_PATH") {
      Ok(path) => match Self::from_file(&path) {
        Ok(cfg) => {
          info!(target: "challenge_engine", %path, "Loaded engine config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "challenge_engine", %path, error = %e, "Failed to load engine config; using defaults");
          Self::default()
        }
      },
      Err(_) => Self::default(),
    };
    cfg.apply_env(|key| std::env::var(key).ok());
    cfg
  }

  fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
    if let Some(port) = get("PORT").and_then(|p| p.parse::<u16>().ok()) {
      self.port = Some(port);
    }
    if let Some(url) = get("BACKEND_BASE_URL").filter(|u| !u.trim().is_empty()) {
      self.backend.base_url = url;
    }
    if let Some(secs) = get("BACKEND_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
      self.backend.timeout_secs = secs;
    }
  }

  pub fn port(&self) -> u16 {
    self.port.unwrap_or(DEFAULT_PORT)
  }
}

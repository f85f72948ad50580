//! Process wiring for the Hail server: configuration and the top-level
//! router.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use axum::Router;
use hail_core::{matching::MatchProvider, store::RideStore};
use hail_dispatch::{DispatchConfig, Dispatcher, SimulationConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HAIL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// SQLite database file; `~/` is expanded.
  pub store_path:         PathBuf,
  /// Default time allowed for a match before the ride is cancelled.
  pub match_timeout_secs: u64,
  /// Settings for the simulated matching provider.
  pub matching:           SimulationConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_owned(),
      port:               3000,
      store_path:         PathBuf::from("hail.db"),
      match_timeout_secs: 30,
      matching:           SimulationConfig::default(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn dispatch(&self) -> DispatchConfig {
    DispatchConfig {
      match_timeout: Duration::from_secs(self.match_timeout_secs),
    }
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
pub fn app<S, P>(dispatcher: Dispatcher<S, P>) -> Router
where
  S: RideStore + 'static,
  P: MatchProvider + 'static,
{
  Router::new()
    .nest("/api", hail_api::api_router(dispatcher))
    .layer(TraceLayer::new_for_http())
}

//! hail-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the ride API and WebSocket push over
//! HTTP. Any setting can be overridden with a `HAIL_` environment variable;
//! nested keys use `__`, e.g. `HAIL_MATCHING__DELAY_MS=500`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use hail_dispatch::{Dispatcher, SimulatedProvider};
use hail_realtime::SubscriptionRegistry;
use hail_server::ServerConfig;
use hail_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Hail ride dispatch server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HAIL").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let dispatcher = Dispatcher::new(
    Arc::new(store),
    Arc::new(SimulatedProvider::new(server_cfg.matching.clone())),
    Arc::new(SubscriptionRegistry::new()),
    server_cfg.dispatch(),
  );

  let app = hail_server::app(dispatcher);
  let address = server_cfg.address();

  tracing::info!(
    store = ?store_path,
    match_timeout_secs = server_cfg.match_timeout_secs,
    match_delay_ms = server_cfg.matching.delay_ms,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

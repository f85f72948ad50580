//! `hail`: rider command line for the Hail dispatch server.
//!
//! # Usage
//!
//! ```text
//! hail request --rider u1 --pickup "12 Main St" --destination Airport
//! hail watch 3f0c…
//! hail --url http://dispatch.local:3000 list --rider u1
//! ```

mod client;
mod render;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::ApiClient;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hail", about = "Request and track rides on a Hail server")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the hail server (default: http://localhost:3000).
  #[arg(long, env = "HAIL_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Request a ride and print the acknowledgement.
  Request {
    #[arg(long)]
    rider:       String,
    #[arg(long)]
    pickup:      String,
    #[arg(long)]
    destination: String,
  },
  /// Show one ride.
  Status { ride_id: Uuid },
  /// List a rider's rides, newest first.
  List {
    #[arg(long)]
    rider: String,
  },
  /// Poll a ride and print each status change until it settles.
  Watch {
    ride_id:     Uuid,
    #[arg(long, default_value_t = 1_000)]
    interval_ms: u64,
  },
  /// Cancel a ride.
  Cancel {
    ride_id: Uuid,
    #[arg(long)]
    reason:  Option<String>,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // Flag / env var, then config file, then default.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());

  let client = ApiClient::new(base_url)?;

  match args.command {
    Command::Request {
      rider,
      pickup,
      destination,
    } => {
      let ack = client.request_ride(&rider, &pickup, &destination).await?;
      println!("{}", render::ack(&ack));
    }
    Command::Status { ride_id } => {
      let ride = client.get_ride(ride_id).await?;
      println!("{}", render::detail(&ride));
    }
    Command::List { rider } => {
      let rides = client.list_rides(&rider).await?;
      if rides.is_empty() {
        println!("no rides for {rider}");
      }
      for ride in &rides {
        println!("{}", render::summary(ride));
      }
    }
    Command::Watch {
      ride_id,
      interval_ms,
    } => watch(&client, ride_id, Duration::from_millis(interval_ms)).await?,
    Command::Cancel { ride_id, reason } => {
      let ride = client.cancel_ride(ride_id, reason.as_deref()).await?;
      println!("{}", render::detail(&ride));
    }
  }

  Ok(())
}

async fn watch(client: &ApiClient, ride_id: Uuid, interval: Duration) -> Result<()> {
  let ride = client.get_ride(ride_id).await?;
  let initial = ride.status();
  println!("{}", render::detail(&ride));

  let mut last = initial;
  while !render::watch_done(initial, last) {
    tokio::time::sleep(interval).await;
    let ride = client.get_ride(ride_id).await?;
    if ride.status() != last {
      last = ride.status();
      println!();
      println!("{}", render::detail(&ride));
    }
  }
  Ok(())
}

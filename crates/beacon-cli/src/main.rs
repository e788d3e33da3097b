//! `beacon`: command-line client for a Beacon server.
//!
//! # Usage
//!
//! ```text
//! beacon current
//! beacon --token s3cret set --lat 12.9716 --lon 77.5946 --address "MG Road" \
//!   --city Bengaluru --state KA --country India
//! beacon watch --interval 10
//! beacon --config ~/.config/beacon/cli.toml history --limit 5
//! ```

mod client;
mod push;
mod sync;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use beacon_core::{
  device::NewDeviceSession,
  location::{LocationInput, LocationRecord},
};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use sync::{SyncAdapter, SyncState};
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "beacon", about = "Command-line client for a Beacon server")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the server (default: http://localhost:5000).
  #[arg(long, env = "BEACON_URL")]
  url: Option<String>,

  /// Admin token for admin commands.
  #[arg(long, env = "BEACON_ADMIN_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the current location.
  Current,
  /// Check the admin token against the server.
  Auth,
  /// Set the current location (admin).
  Set {
    #[arg(long, allow_negative_numbers = true)]
    lat:     f64,
    #[arg(long, allow_negative_numbers = true)]
    lon:     f64,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city:    String,
    #[arg(long)]
    state:   String,
    #[arg(long)]
    country: String,
  },
  /// List past locations, newest first (admin).
  History {
    #[arg(long, default_value_t = 20)]
    limit: usize,
  },
  /// Register this device with the server.
  Register {
    #[arg(long)]
    device_id:         String,
    #[arg(long)]
    push_subscription: Option<String>,
  },
  /// Print server health.
  Health,
  /// Follow the current location, printing each change.
  Watch {
    /// Seconds between polls.
    #[arg(long, default_value_t = sync::DEFAULT_POLL_INTERVAL.as_secs())]
    interval: u64,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:5000".to_string()),
    token:    args
      .token
      .or_else(|| (!file_cfg.token.is_empty()).then(|| file_cfg.token.clone())),
  };

  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::Current => match client.current_location().await? {
      Some(record) => print_record(&record),
      None => println!("No location has been set yet."),
    },
    Command::Auth => {
      if !client.authenticate().await? {
        bail!("admin token rejected");
      }
      println!("Authentication successful");
    }
    Command::Set { lat, lon, address, city, state, country } => {
      let input = LocationInput { latitude: lat, longitude: lon, address, city, state, country };
      let record = client.update_location(&input).await?;
      println!("Location updated (id {}).", record.id);
      print_record(&record);
    }
    Command::History { limit } => {
      for record in client.history(limit).await? {
        let marker = if record.is_active { "*" } else { " " };
        println!(
          "{marker} {:>6}  {}  {}, {}  {}, {}  ({})",
          record.id,
          record.created_at.format("%Y-%m-%d %H:%M:%S"),
          record.latitude,
          record.longitude,
          record.city,
          record.country,
          record.updated_by,
        );
      }
    }
    Command::Register { device_id, push_subscription } => {
      let session =
        client.register_device(&NewDeviceSession { device_id, push_subscription }).await?;
      println!("{}", serde_json::to_string_pretty(&session)?);
    }
    Command::Health => {
      let health = client.health().await?;
      println!(
        "{} at {} ({} live connections)",
        health.status, health.timestamp, health.connections
      );
    }
    Command::Watch { interval } => watch(client, Duration::from_secs(interval.max(1))).await?,
  }

  Ok(())
}

// ─── Watch ────────────────────────────────────────────────────────────────────

/// Follow the location until Ctrl-C: pushes from `/ws` are applied as they
/// arrive, with a poll every `interval` underneath.
async fn watch(client: ApiClient, interval: Duration) -> Result<()> {
  let url = push::push_url(client.base_url());
  let (adapter, mut rx) = SyncAdapter::new(client, interval);
  let (tx, pushes) = mpsc::channel::<String>(16);
  let forwarder = tokio::spawn(push::forward_pushes(url, tx, push::RECONNECT_DELAY));
  let task = tokio::spawn(adapter.run(pushes));

  loop {
    tokio::select! {
      changed = rx.changed() => {
        if changed.is_err() {
          break;
        }
        let state = rx.borrow_and_update().clone();
        match state {
          SyncState::Loading => {}
          SyncState::Empty => println!("No location has been set yet."),
          SyncState::Ready(record) => print_record(&record),
        }
      }
      _ = tokio::signal::ctrl_c() => break,
    }
  }

  drop(rx);
  task.await.context("sync task panicked")?;
  forwarder.await.context("push forwarder panicked")?;
  Ok(())
}

fn print_record(record: &LocationRecord) {
  println!(
    "{}, {}  {}, {}, {}, {}  (updated {} by {})",
    record.latitude,
    record.longitude,
    record.address,
    record.city,
    record.state,
    record.country,
    record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    record.updated_by,
  );
}

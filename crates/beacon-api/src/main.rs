//! beacon-server binary.
//!
//! Reads `beacon.toml` (or the path given with `--config`) layered under
//! `BEACON_*` environment variables, opens the SQLite store, and serves the
//! gateway over HTTP until Ctrl-C.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use beacon_api::{AppState, LEGACY_TOKEN_VAR, ServerConfig};
use beacon_service::{AdminAuthenticator, BroadcastHub};
use beacon_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Beacon location server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "beacon.toml")]
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
    .add_source(config::Environment::with_prefix("BEACON"))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let legacy_token = std::env::var(LEGACY_TOKEN_VAR).ok();
  let admin_secret = server_cfg.admin_secret(legacy_token.as_deref());

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let hub = BroadcastHub::new(server_cfg.push_buffer);
  let auth = AdminAuthenticator::from_config(admin_secret.as_deref());
  let state = AppState::new(Arc::new(store), hub.clone(), auth);

  let app = beacon_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(hub))
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Resolves on Ctrl-C, after draining the push hub so open sockets close
/// and the server can finish.
async fn shutdown_signal(hub: BroadcastHub) {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
  hub.close_all();
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

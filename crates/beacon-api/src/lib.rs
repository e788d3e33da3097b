//! HTTP ingress for Beacon.
//!
//! Exposes an axum [`Router`] over a [`LocationService`] backed by any
//! [`LocationStore`]: the public location read, the admin endpoints, device
//! registration, the Telegram webhook, a health check, and the `/ws` push
//! channel.

pub mod admin;
pub mod auth;
pub mod body;
pub mod devices;
pub mod error;
pub mod health;
pub mod location;
pub mod push;
pub mod webhook;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use beacon_core::store::LocationStore;
use beacon_service::{AdminAuthenticator, BroadcastHub, LocationService, hub::DEFAULT_BUFFER};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Secret variable honoured for deployments that predate `BEACON_ADMIN_TOKEN`.
pub const LEGACY_TOKEN_VAR: &str = "ADMIN_SECRET_TOKEN";

/// Runtime server configuration, deserialised from `beacon.toml` and
/// `BEACON_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  /// Shared admin secret. Falls back to a built-in default when unset.
  pub admin_token: Option<String>,
  /// Per-connection push buffer, in messages.
  pub push_buffer: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:        "0.0.0.0".to_owned(),
      port:        5000,
      store_path:  PathBuf::from("beacon.db"),
      admin_token: None,
      push_buffer: DEFAULT_BUFFER,
    }
  }
}

impl ServerConfig {
  /// The admin secret to run with: the configured token, else `legacy`
  /// (the value of [`LEGACY_TOKEN_VAR`]). Blank values count as unset, so
  /// an empty `BEACON_ADMIN_TOKEN` never hides a real legacy secret.
  pub fn admin_secret(&self, legacy: Option<&str>) -> Option<String> {
    [self.admin_token.as_deref(), legacy]
      .into_iter()
      .flatten()
      .map(str::trim)
      .find(|s| !s.is_empty())
      .map(str::to_owned)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub service: LocationService<S>,
  pub auth:    Arc<AdminAuthenticator>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { service: self.service.clone(), auth: Arc::clone(&self.auth) }
  }
}

impl<S> AppState<S>
where
  S: LocationStore,
{
  pub fn new(store: Arc<S>, hub: BroadcastHub, auth: AdminAuthenticator) -> Self {
    Self { service: LocationService::new(store, hub), auth: Arc::new(auth) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway [`Router`], with request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LocationStore + 'static,
{
  Router::new()
    // Public
    .route("/api/location", get(location::current::<S>))
    .route("/api/guru-location", get(location::current::<S>))
    .route("/api/health", get(health::handler::<S>))
    .route("/api/device/register", post(devices::register::<S>))
    .route("/api/telegram-webhook", post(webhook::telegram::<S>))
    // Admin
    .route("/api/admin/auth", post(admin::authenticate::<S>))
    .route("/api/admin/update-location", post(location::admin_update::<S>))
    .route("/api/admin/location-history", get(location::history::<S>))
    // Push
    .route("/ws", get(push::upgrade::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

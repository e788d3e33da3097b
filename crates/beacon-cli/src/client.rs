//! Async HTTP client wrapping the Beacon gateway.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use beacon_core::{
  device::{DeviceSession, NewDeviceSession},
  location::{LocationInput, LocationRecord},
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Connection settings for the gateway.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Admin token, sent as a bearer credential on admin calls.
  pub token:    Option<String>,
}

/// Async HTTP client for the Beacon JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct UpdateResponse {
  location: LocationRecord,
}

#[derive(Deserialize)]
struct RegisterResponse {
  session: DeviceSession,
}

/// `GET /api/health` body.
#[derive(Debug, Deserialize)]
pub struct Health {
  pub status:      String,
  pub timestamp:   chrono::DateTime<chrono::Utc>,
  pub connections: usize,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn token(&self) -> Result<&str> {
    self
      .config
      .token
      .as_deref()
      .ok_or_else(|| anyhow!("an admin token is required (--token or BEACON_ADMIN_TOKEN)"))
  }

  // ── Public ────────────────────────────────────────────────────────────────

  /// `GET /api/location`. `None` when no location has been set yet.
  pub async fn current_location(&self) -> Result<Option<LocationRecord>> {
    let resp = self
      .client
      .get(self.url("/location"))
      .send()
      .await
      .context("GET /location failed")?;

    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let resp = ensure_success(resp, "GET /location").await?;
    resp.json().await.map(Some).context("deserialising location")
  }

  /// `POST /api/device/register`
  pub async fn register_device(&self, input: &NewDeviceSession) -> Result<DeviceSession> {
    let resp = self
      .client
      .post(self.url("/device/register"))
      .json(input)
      .send()
      .await
      .context("POST /device/register failed")?;

    let body: RegisterResponse = ensure_success(resp, "POST /device/register")
      .await?
      .json()
      .await
      .context("deserialising device session")?;
    Ok(body.session)
  }

  /// `GET /api/health`
  pub async fn health(&self) -> Result<Health> {
    let resp = self
      .client
      .get(self.url("/health"))
      .send()
      .await
      .context("GET /health failed")?;
    ensure_success(resp, "GET /health")
      .await?
      .json()
      .await
      .context("deserialising health")
  }

  // ── Admin ─────────────────────────────────────────────────────────────────

  /// `POST /api/admin/auth`. `Ok(false)` when the server rejects the token.
  pub async fn authenticate(&self) -> Result<bool> {
    let resp = self
      .client
      .post(self.url("/admin/auth"))
      .json(&json!({ "token": self.token()? }))
      .send()
      .await
      .context("POST /admin/auth failed")?;

    if resp.status() == StatusCode::UNAUTHORIZED {
      return Ok(false);
    }
    ensure_success(resp, "POST /admin/auth").await?;
    Ok(true)
  }

  /// `POST /api/admin/update-location`
  pub async fn update_location(&self, input: &LocationInput) -> Result<LocationRecord> {
    let resp = self
      .client
      .post(self.url("/admin/update-location"))
      .bearer_auth(self.token()?)
      .json(input)
      .send()
      .await
      .context("POST /admin/update-location failed")?;

    let body: UpdateResponse = ensure_success(resp, "POST /admin/update-location")
      .await?
      .json()
      .await
      .context("deserialising updated location")?;
    Ok(body.location)
  }

  /// `GET /api/admin/location-history?limit=<n>`
  pub async fn history(&self, limit: usize) -> Result<Vec<LocationRecord>> {
    let resp = self
      .client
      .get(self.url("/admin/location-history"))
      .bearer_auth(self.token()?)
      .query(&[("limit", limit)])
      .send()
      .await
      .context("GET /admin/location-history failed")?;

    ensure_success(resp, "GET /admin/location-history")
      .await?
      .json()
      .await
      .context("deserialising history")
  }
}

/// Pass successful responses through; turn anything else into an error that
/// carries the server's `error` text and any field details.
async fn ensure_success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }

  let body: serde_json::Value = resp.json().await.unwrap_or_default();
  let mut message = body["error"].as_str().unwrap_or("no error message").to_owned();
  if let Some(details) = body["details"].as_array() {
    for d in details {
      let field = d["field"].as_str().unwrap_or("?");
      let text = d["message"].as_str().unwrap_or("invalid");
      message.push_str(&format!("\n  {field}: {text}"));
    }
  }
  Err(anyhow!("{what} → {status}: {message}"))
}

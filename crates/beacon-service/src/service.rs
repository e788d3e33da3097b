//! [`LocationService`]: validation, activation and broadcast.
//!
//! There are two ways in. [`LocationService::admin_update`] requires an
//! [`AdminGrant`]; [`LocationService::ingest_webhook`] requires nothing but
//! can only set coordinates. Both go through the same validate → activate →
//! publish path.

use std::sync::Arc;

use beacon_core::{
  device::{DeviceSession, NewDeviceSession},
  location::{LocationInput, LocationRecord, SourceIdentity},
  store::LocationStore,
};
use validator::Validate as _;

use crate::{AdminGrant, BroadcastHub, Error, Result};

/// Placeholder address text for webhook-ingested locations, which arrive as
/// bare coordinates. Reverse geocoding would replace these.
pub const WEBHOOK_ADDRESS: &str = "Location from Telegram";
pub const WEBHOOK_UNKNOWN: &str = "Unknown";

/// Upper bound on a single history page.
pub const MAX_HISTORY: usize = 500;

pub struct LocationService<S> {
  store: Arc<S>,
  hub:   BroadcastHub,
}

impl<S> Clone for LocationService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), hub: self.hub.clone() }
  }
}

impl<S> LocationService<S>
where
  S: LocationStore,
{
  pub fn new(store: Arc<S>, hub: BroadcastHub) -> Self { Self { store, hub } }

  pub fn hub(&self) -> &BroadcastHub { &self.hub }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Admin entry point: tagged `admin_web`.
  pub async fn admin_update(
    &self,
    _grant: &AdminGrant,
    data: LocationInput,
  ) -> Result<LocationRecord> {
    self.update_location(data, SourceIdentity::AdminWeb).await
  }

  /// Webhook entry point: bare coordinates, placeholder address fields,
  /// tagged `telegram_bot`.
  pub async fn ingest_webhook(&self, latitude: f64, longitude: f64) -> Result<LocationRecord> {
    let data = LocationInput {
      latitude,
      longitude,
      address: WEBHOOK_ADDRESS.to_owned(),
      city:    WEBHOOK_UNKNOWN.to_owned(),
      state:   WEBHOOK_UNKNOWN.to_owned(),
      country: WEBHOOK_UNKNOWN.to_owned(),
    };
    self.update_location(data, SourceIdentity::TelegramBot).await
  }

  /// Validate `data`, make it the active location, then notify every live
  /// connection.
  ///
  /// Nothing touches the store when validation fails. The broadcast happens
  /// only after the store has committed, and its outcome never affects the
  /// result.
  pub(crate) async fn update_location(
    &self,
    data: LocationInput,
    source: SourceIdentity,
  ) -> Result<LocationRecord> {
    let candidate = data.into_new_location(source)?;

    let record = self.store.activate(candidate).await.map_err(|e| {
      tracing::error!(error = %e, "failed to activate location");
      Error::storage(e)
    })?;
    tracing::info!(id = record.id, source = %source, "location activated");

    if let Err(e) = self.hub.publish(&record) {
      tracing::error!(error = %e, id = record.id, "failed to serialise push event");
    }

    Ok(record)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// The active location, or [`Error::NotFound`] before the first update.
  pub async fn current_location(&self) -> Result<LocationRecord> {
    self
      .store
      .get_active()
      .await
      .map_err(|e| {
        tracing::error!(error = %e, "failed to read active location");
        Error::storage(e)
      })?
      .ok_or(Error::NotFound)
  }

  /// Up to `limit` past locations, newest first. Admin only.
  pub async fn history(&self, _grant: &AdminGrant, limit: usize) -> Result<Vec<LocationRecord>> {
    self
      .store
      .history(limit.clamp(1, MAX_HISTORY))
      .await
      .map_err(|e| {
        tracing::error!(error = %e, "failed to read location history");
        Error::storage(e)
      })
  }

  // ── Devices ───────────────────────────────────────────────────────────────

  pub async fn register_device(&self, input: NewDeviceSession) -> Result<DeviceSession> {
    input.validate().map_err(Error::InvalidDevice)?;
    let returning = self
      .store
      .get_device(&input.device_id)
      .await
      .map_err(|e| {
        tracing::error!(error = %e, "failed to look up device");
        Error::storage(e)
      })?
      .is_some();
    let session = self.store.register_device(input).await.map_err(|e| {
      tracing::error!(error = %e, "failed to register device");
      Error::storage(e)
    })?;
    tracing::debug!(device_id = %session.device_id, returning, "device registered");
    Ok(session)
  }
}

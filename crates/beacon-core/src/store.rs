//! The `LocationStore` trait.
//!
//! Implemented by storage backends (e.g. `beacon-store-sqlite`). The service
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  device::{DeviceSession, NewDeviceSession},
  location::{LocationRecord, NewLocation},
};

/// Abstraction over a Beacon storage backend.
///
/// Location rows are append-only apart from the active flag. At most one row
/// is active at any instant, as observed by any reader, including readers in
/// other processes sharing the same backing store.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait LocationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Locations ─────────────────────────────────────────────────────────

  /// The currently active record, or `None` before the first activation.
  fn get_active(
    &self,
  ) -> impl Future<Output = Result<Option<LocationRecord>, Self::Error>> + Send + '_;

  /// In one transaction: clear the active flag on the current record and
  /// insert `candidate` as the new active record. `id` and `created_at` are
  /// assigned by the store; `created_at` is strictly later than that of the
  /// record being deactivated.
  fn activate(
    &self,
    candidate: NewLocation,
  ) -> impl Future<Output = Result<LocationRecord, Self::Error>> + Send + '_;

  /// Up to `limit` records, newest first, active and inactive alike.
  fn history(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<LocationRecord>, Self::Error>> + Send + '_;

  // ── Devices ───────────────────────────────────────────────────────────

  /// Insert or update the session keyed on `device_id`.
  fn register_device(
    &self,
    input: NewDeviceSession,
  ) -> impl Future<Output = Result<DeviceSession, Self::Error>> + Send + '_;

  fn get_device<'a>(
    &'a self,
    device_id: &'a str,
  ) -> impl Future<Output = Result<Option<DeviceSession>, Self::Error>> + Send + 'a;
}

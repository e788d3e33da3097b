//! [`SqliteStore`], the SQLite implementation of [`LocationStore`].

use std::{path::Path, time::Duration};

use beacon_core::{
  device::{DeviceSession, NewDeviceSession},
  location::{LocationRecord, NewLocation},
  store::LocationStore,
};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Result,
  encode::{DEVICE_COLUMNS, LOCATION_COLUMNS, RawDevice, RawLocation, decode_dt, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Beacon store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Pick a creation timestamp strictly after `previous`, preferring `now`.
fn next_created_at(now: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
  match previous {
    Some(prev) if prev >= now => prev + TimeDelta::microseconds(1),
    _ => now,
  }
}

// ─── LocationStore impl ──────────────────────────────────────────────────────

impl LocationStore for SqliteStore {
  type Error = crate::Error;

  // ── Locations ─────────────────────────────────────────────────────────────

  async fn get_active(&self) -> Result<Option<LocationRecord>> {
    let raw: Option<RawLocation> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE is_active = 1"),
            [],
            RawLocation::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawLocation::into_record).transpose()
  }

  async fn activate(&self, candidate: NewLocation) -> Result<LocationRecord> {
    let now = Utc::now();
    let row = candidate.clone();

    let (id, created_at_str): (i64, String) = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front so two processes cannot
        // interleave their deactivate/insert pairs.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<String> = tx
          .query_row(
            "SELECT created_at FROM locations WHERE is_active = 1",
            [],
            |r| r.get(0),
          )
          .optional()?;
        let previous = previous
          .map(|s| decode_dt(&s))
          .transpose()
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
        let created_at = encode_dt(next_created_at(now, previous));

        tx.execute("UPDATE locations SET is_active = 0 WHERE is_active = 1", [])?;
        tx.execute(
          "INSERT INTO locations (
             latitude, longitude, address, city, state, country,
             updated_by, created_at, is_active
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
          rusqlite::params![
            row.latitude.units(),
            row.longitude.units(),
            row.address,
            row.city,
            row.state,
            row.country,
            row.updated_by.as_str(),
            created_at,
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok((id, created_at))
      })
      .await?;

    let record = LocationRecord {
      id,
      latitude:   candidate.latitude,
      longitude:  candidate.longitude,
      address:    candidate.address,
      city:       candidate.city,
      state:      candidate.state,
      country:    candidate.country,
      updated_by: candidate.updated_by.as_str().to_owned(),
      created_at: decode_dt(&created_at_str)?,
      is_active:  true,
    };
    tracing::debug!(id = record.id, "location row activated");
    Ok(record)
  }

  async fn history(&self, limit: usize) -> Result<Vec<LocationRecord>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawLocation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOCATION_COLUMNS} FROM locations ORDER BY id DESC LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawLocation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLocation::into_record).collect()
  }

  // ── Devices ───────────────────────────────────────────────────────────────

  async fn register_device(&self, input: NewDeviceSession) -> Result<DeviceSession> {
    let seen_str = encode_dt(Utc::now());

    let raw: RawDevice = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO device_sessions (device_id, last_seen, push_subscription, is_active)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(device_id) DO UPDATE SET
               last_seen         = excluded.last_seen,
               push_subscription = excluded.push_subscription,
               is_active         = 1
             RETURNING {DEVICE_COLUMNS}"
          ),
          rusqlite::params![input.device_id, seen_str, input.push_subscription],
          RawDevice::from_row,
        )?)
      })
      .await?;

    raw.into_session()
  }

  async fn get_device(&self, device_id: &str) -> Result<Option<DeviceSession>> {
    let device_id = device_id.to_owned();

    let raw: Option<RawDevice> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DEVICE_COLUMNS} FROM device_sessions WHERE device_id = ?1"),
            rusqlite::params![device_id],
            RawDevice::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDevice::into_session).transpose()
  }
}

//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with microsecond precision and a `Z`
//! suffix, so lexical order matches chronological order. Coordinates are
//! stored as their integer unit count.

use beacon_core::{
  Coordinate,
  device::DeviceSession,
  location::LocationRecord,
};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column list matching [`RawLocation::from_row`].
pub const LOCATION_COLUMNS: &str =
  "id, latitude, longitude, address, city, state, country, updated_by, created_at, is_active";

/// A `locations` row before timestamp decoding.
pub struct RawLocation {
  pub id:         i64,
  pub latitude:   i64,
  pub longitude:  i64,
  pub address:    String,
  pub city:       String,
  pub state:      String,
  pub country:    String,
  pub updated_by: String,
  pub created_at: String,
  pub is_active:  bool,
}

impl RawLocation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      latitude:   row.get(1)?,
      longitude:  row.get(2)?,
      address:    row.get(3)?,
      city:       row.get(4)?,
      state:      row.get(5)?,
      country:    row.get(6)?,
      updated_by: row.get(7)?,
      created_at: row.get(8)?,
      is_active:  row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<LocationRecord> {
    Ok(LocationRecord {
      id:         self.id,
      latitude:   Coordinate::from_units(self.latitude),
      longitude:  Coordinate::from_units(self.longitude),
      address:    self.address,
      city:       self.city,
      state:      self.state,
      country:    self.country,
      updated_by: self.updated_by,
      created_at: decode_dt(&self.created_at)?,
      is_active:  self.is_active,
    })
  }
}

/// Column list matching [`RawDevice::from_row`].
pub const DEVICE_COLUMNS: &str = "id, device_id, last_seen, push_subscription, is_active";

/// A `device_sessions` row before timestamp decoding.
pub struct RawDevice {
  pub id:                i64,
  pub device_id:         String,
  pub last_seen:         String,
  pub push_subscription: Option<String>,
  pub is_active:         bool,
}

impl RawDevice {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      device_id:         row.get(1)?,
      last_seen:         row.get(2)?,
      push_subscription: row.get(3)?,
      is_active:         row.get(4)?,
    })
  }

  pub fn into_session(self) -> Result<DeviceSession> {
    Ok(DeviceSession {
      id:                self.id,
      device_id:         self.device_id,
      last_seen:         decode_dt(&self.last_seen)?,
      push_subscription: self.push_subscription,
      is_active:         self.is_active,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 6_000).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(a)).unwrap(), a);
  }

  #[test]
  fn bad_timestamp_is_a_date_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}

//! Location records and the inputs that produce them.
//!
//! A [`LocationRecord`] is never edited after insertion, apart from its
//! `is_active` flag being cleared when a newer record is activated. The single
//! active record is the system's answer to "where is it now".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{Coordinate, Result};

// ─── Source identity ─────────────────────────────────────────────────────────

/// Which entry point produced a location update. Stored in `updated_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceIdentity {
  /// The authenticated admin panel.
  AdminWeb,
  /// The unauthenticated Telegram webhook.
  TelegramBot,
}

impl SourceIdentity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::AdminWeb => "admin_web",
      Self::TelegramBot => "telegram_bot",
    }
  }
}

impl fmt::Display for SourceIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted location, as returned by the store and sent to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
  /// Monotonically increasing, assigned by the store.
  pub id:         i64,
  pub latitude:   Coordinate,
  pub longitude:  Coordinate,
  pub address:    String,
  pub city:       String,
  pub state:      String,
  pub country:    String,
  pub updated_by: String,
  /// Server-assigned at activation time.
  pub created_at: DateTime<Utc>,
  pub is_active:  bool,
}

/// A validated location waiting to be activated by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
  pub latitude:   Coordinate,
  pub longitude:  Coordinate,
  pub address:    String,
  pub city:       String,
  pub state:      String,
  pub country:    String,
  pub updated_by: SourceIdentity,
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Raw location fields as submitted by an update source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInput {
  pub latitude:  f64,
  pub longitude: f64,
  pub address:   String,
  pub city:      String,
  pub state:     String,
  pub country:   String,
}

impl LocationInput {
  /// Validate and convert into a [`NewLocation`] tagged with `source`.
  pub fn into_new_location(self, source: SourceIdentity) -> Result<NewLocation> {
    self.validate()?;
    Ok(NewLocation {
      latitude:   Coordinate::from_degrees(self.latitude)?,
      longitude:  Coordinate::from_degrees(self.longitude)?,
      address:    self.address,
      city:       self.city,
      state:      self.state,
      country:    self.country,
      updated_by: source,
    })
  }
}

impl Validate for LocationInput {
  fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Err(e) = validate_latitude(self.latitude) {
      errors.add("latitude", e);
    }
    if let Err(e) = validate_longitude(self.longitude) {
      errors.add("longitude", e);
    }
    for (field, value) in [
      ("address", &self.address),
      ("city", &self.city),
      ("state", &self.state),
      ("country", &self.country),
    ] {
      if let Err(e) = validate_not_blank(field, value) {
        errors.add(field, e);
      }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}

// ─── Field validators ────────────────────────────────────────────────────────

/// Latitude must lie in [-90, 90]. NaN fails.
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
  if (-90.0..=90.0).contains(&lat) {
    Ok(())
  } else {
    let mut err = ValidationError::new("latitude_range");
    err.message = Some("Latitude must be between -90 and 90".into());
    Err(err)
  }
}

/// Longitude must lie in [-180, 180]. NaN fails.
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
  if (-180.0..=180.0).contains(&lon) {
    Ok(())
  } else {
    let mut err = ValidationError::new("longitude_range");
    err.message = Some("Longitude must be between -180 and 180".into());
    Err(err)
  }
}

pub fn validate_not_blank(field: &str, value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    let mut err = ValidationError::new("required");
    err.message = Some(format!("{field} must not be empty").into());
    Err(err)
  } else {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  fn input(latitude: f64, longitude: f64) -> LocationInput {
    LocationInput {
      latitude,
      longitude,
      address: "MG Road".into(),
      city:    "Bengaluru".into(),
      state:   "KA".into(),
      country: "India".into(),
    }
  }

  fn failing_fields(input: &LocationInput) -> Vec<String> {
    let errors = input.validate().unwrap_err();
    let mut fields: Vec<String> =
      errors.field_errors().keys().map(|k| k.to_string()).collect();
    fields.sort();
    fields
  }

  #[test]
  fn latitude_boundaries() {
    assert!(input(90.0, 0.0).validate().is_ok());
    assert!(input(-90.0, 0.0).validate().is_ok());
    assert_eq!(failing_fields(&input(90.000_000_1, 0.0)), ["latitude"]);
    assert_eq!(failing_fields(&input(f64::NAN, 0.0)), ["latitude"]);
  }

  #[test]
  fn longitude_boundaries() {
    assert!(input(0.0, -180.0).validate().is_ok());
    assert!(input(0.0, 180.0).validate().is_ok());
    assert_eq!(failing_fields(&input(0.0, 180.5)), ["longitude"]);
  }

  #[test]
  fn blank_strings_are_named() {
    let mut bad = input(0.0, 0.0);
    bad.city = String::new();
    bad.country = "   ".into();
    assert_eq!(failing_fields(&bad), ["city", "country"]);
  }

  #[test]
  fn every_offending_field_is_reported() {
    let mut bad = input(91.0, -181.0);
    bad.address = String::new();
    assert_eq!(failing_fields(&bad), ["address", "latitude", "longitude"]);
  }

  #[test]
  fn into_new_location_tags_source() {
    let new = input(12.9716, 77.5946)
      .into_new_location(SourceIdentity::AdminWeb)
      .unwrap();
    assert_eq!(new.updated_by, SourceIdentity::AdminWeb);
    assert_eq!(new.latitude.to_string(), "12.97160000");
    assert_eq!(new.longitude.to_string(), "77.59460000");
  }

  #[test]
  fn into_new_location_surfaces_validation_errors() {
    let result = input(100.0, 0.0).into_new_location(SourceIdentity::TelegramBot);
    assert!(matches!(result, Err(Error::Validation(_))));
  }

  #[test]
  fn record_serialises_camel_case_with_string_coordinates() {
    let record = LocationRecord {
      id:         7,
      latitude:   Coordinate::from_units(1_297_160_000),
      longitude:  Coordinate::from_units(7_759_460_000),
      address:    "X".into(),
      city:       "Bengaluru".into(),
      state:      "KA".into(),
      country:    "India".into(),
      updated_by: "admin_web".into(),
      created_at: DateTime::<Utc>::UNIX_EPOCH,
      is_active:  true,
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["latitude"], "12.97160000");
    assert_eq!(json["updatedBy"], "admin_web");
    assert_eq!(json["isActive"], true);
    assert!(json.get("createdAt").is_some());
  }
}

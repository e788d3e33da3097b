//! Device sessions: one row per registered viewer device.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::location::validate_not_blank;

/// A registered device. Upserted on `device_id`; never duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSession {
  pub id:                i64,
  pub device_id:         String,
  pub last_seen:         DateTime<Utc>,
  /// Opaque push-subscription payload supplied by the client.
  pub push_subscription: Option<String>,
  pub is_active:         bool,
}

/// A registration request. A later registration for the same `device_id`
/// overwrites `push_subscription` (including clearing it) and refreshes
/// `last_seen`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeviceSession {
  pub device_id:         String,
  #[serde(default)]
  pub push_subscription: Option<String>,
}

impl Validate for NewDeviceSession {
  fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Err(e) = validate_not_blank("deviceId", &self.device_id) {
      errors.add("deviceId", e);
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}

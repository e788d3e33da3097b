//! Messages carried by the push channel.

use serde::{Deserialize, Serialize};

use crate::location::LocationRecord;

/// A server-to-client push message.
///
/// Serialised adjacently tagged: `{"type": "location_update", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
  /// A new location was committed; `data` is the new active record.
  LocationUpdate(LocationRecord),
}

//! `GET /api/health`: liveness check.

use axum::{Json, extract::State};
use beacon_core::store::LocationStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:      &'static str,
  pub timestamp:   DateTime<Utc>,
  /// Live push connections.
  pub connections: usize,
}

pub async fn handler<S>(State(state): State<AppState<S>>) -> Json<Health>
where
  S: LocationStore + 'static,
{
  Json(Health {
    status:      "ok",
    timestamp:   Utc::now(),
    connections: state.service.hub().len(),
  })
}

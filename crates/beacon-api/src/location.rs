//! Handlers for the location endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/location` | Active record, or `404` before the first update |
//! | `GET`  | `/api/guru-location` | Same; the path earlier web and mobile clients use |
//! | `POST` | `/api/admin/update-location` | Bearer admin token; body: [`LocationInput`] |
//! | `GET`  | `/api/admin/location-history` | Bearer admin token; `?limit=N` (default 50) |

use axum::{
  Json,
  extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
};
use beacon_core::{
  location::{
    LocationInput, LocationRecord, validate_latitude, validate_longitude, validate_not_blank,
  },
  store::LocationStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppState, auth::Admin, body::Fields, error::ApiError};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /api/location`
pub async fn current<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<LocationRecord>, ApiError>
where
  S: LocationStore + 'static,
{
  Ok(Json(state.service.current_location().await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
  pub success:  bool,
  pub location: LocationRecord,
}

/// Read a [`LocationInput`], reporting every missing, mistyped, blank or
/// out-of-range field at once.
pub fn location_input(body: &Value) -> Result<LocationInput, ApiError> {
  let mut f = Fields::of(body)?;

  let latitude = f.number("latitude");
  let longitude = f.number("longitude");
  if let Some(lat) = latitude {
    f.check("latitude", validate_latitude(lat));
  }
  if let Some(lon) = longitude {
    f.check("longitude", validate_longitude(lon));
  }

  let address = text_field(&mut f, "address");
  let city = text_field(&mut f, "city");
  let state = text_field(&mut f, "state");
  let country = text_field(&mut f, "country");

  let input = (|| {
    Some(LocationInput {
      latitude:  latitude?,
      longitude: longitude?,
      address:   address?,
      city:      city?,
      state:     state?,
      country:   country?,
    })
  })();
  f.finish("Invalid location data", input)
}

fn text_field(f: &mut Fields<'_>, field: &'static str) -> Option<String> {
  let value = f.string(field);
  if let Some(v) = &value {
    f.check(field, validate_not_blank(field, v));
  }
  value
}

/// `POST /api/admin/update-location`
///
/// [`Admin`] is extracted before the body, so an unauthorized request is
/// refused whatever it carries.
pub async fn admin_update<S>(
  State(state): State<AppState<S>>,
  Admin(grant): Admin,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError>
where
  S: LocationStore + 'static,
{
  let Json(body) = body?;
  let input = location_input(&body)?;
  let location = state.service.admin_update(&grant, input).await?;
  Ok(Json(UpdateResponse { success: true, location }))
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /api/admin/location-history[?limit=N]`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  Admin(grant): Admin,
  params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<LocationRecord>>, ApiError>
where
  S: LocationStore + 'static,
{
  let Query(params) = params?;
  let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
  Ok(Json(state.service.history(&grant, limit).await?))
}

//! `POST /api/device/register`: upsert a viewer device session.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use beacon_core::{
  device::{DeviceSession, NewDeviceSession},
  store::LocationStore,
};
use beacon_core::location::validate_not_blank;
use serde::Serialize;
use serde_json::Value;

use crate::{AppState, body::Fields, error::ApiError};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
  pub success: bool,
  pub session: DeviceSession,
}

pub fn device_input(body: &Value) -> Result<NewDeviceSession, ApiError> {
  let mut f = Fields::of(body)?;
  let device_id = f.string("deviceId");
  if let Some(id) = &device_id {
    f.check("deviceId", validate_not_blank("deviceId", id));
  }
  let push_subscription = f.optional_string("pushSubscription");
  let input = device_id.map(|device_id| NewDeviceSession { device_id, push_subscription });
  f.finish("Invalid device registration", input)
}

pub async fn register<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError>
where
  S: LocationStore + 'static,
{
  let Json(body) = body?;
  let input = device_input(&body)?;
  let session = state.service.register_device(input).await?;
  Ok(Json(RegisterResponse { success: true, session }))
}

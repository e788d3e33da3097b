//! `POST /api/admin/auth`: lets the admin panel check a token before using it.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use beacon_core::store::LocationStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AuthBody {
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub success: bool,
  pub message: &'static str,
}

pub async fn authenticate<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<AuthBody>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: LocationStore + 'static,
{
  let Json(AuthBody { token }) = body?;
  state.auth.verify(&token)?;
  Ok(Json(AuthResponse { success: true, message: "Authentication successful" }))
}

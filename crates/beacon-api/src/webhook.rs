//! `POST /api/telegram-webhook`: location ingestion from a Telegram bot.
//!
//! The body is a Telegram `Update`. Only `message.location` is read; every
//! other field is ignored. No admin token is required, and the stored record
//! is tagged `telegram_bot` with placeholder address fields.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use beacon_core::store::LocationStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
  pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
  pub location: Option<TelegramLocation>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramLocation {
  pub latitude:  f64,
  pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
  pub success: bool,
}

pub async fn telegram<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<TelegramUpdate>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError>
where
  S: LocationStore + 'static,
{
  let Json(update) = body?;
  let location = update
    .message
    .and_then(|m| m.location)
    .ok_or_else(|| ApiError::BadRequest("No location data in message".to_owned()))?;

  let record = state
    .service
    .ingest_webhook(location.latitude, location.longitude)
    .await?;
  tracing::debug!(id = record.id, "webhook location accepted");
  Ok(Json(WebhookResponse { success: true }))
}

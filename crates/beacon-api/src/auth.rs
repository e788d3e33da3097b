//! Bearer-token admin extractor.
//!
//! Handlers that take an [`Admin`] argument run only after the
//! `Authorization: Bearer <token>` header has been verified. The extractor
//! reads headers only, so a rejected request never has its body parsed and
//! never reaches the store.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use beacon_core::store::LocationStore;
use beacon_service::AdminGrant;

use crate::{AppState, error::ApiError};

/// A verified admin credential.
pub struct Admin(pub AdminGrant);

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: LocationStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or(ApiError::Unauthorized("Missing or malformed authorization header"))?;
    let grant = state.auth.verify(token)?;
    Ok(Admin(grant))
  }
}

/// The token from an `Authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively; an empty token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  let token = token.trim();
  (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn bearer_token_parsing() {
    assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
    assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    assert_eq!(bearer_token(&headers("Basic abc")), None);
    assert_eq!(bearer_token(&headers("Bearer ")), None);
    assert_eq!(bearer_token(&headers("abc")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }
}

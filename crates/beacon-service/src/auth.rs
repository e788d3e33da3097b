//! Shared-secret admin authentication.
//!
//! There is one admin secret per deployment. A request is an admin request
//! when the token it presents equals that secret; there are no sessions,
//! expiry, or rotation.

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Used when no secret is configured. Anyone who has read this source knows
/// it, so the server logs a warning at startup when it is in effect.
pub const DEFAULT_ADMIN_TOKEN: &str = "beacon-admin";

/// Proof that an admin credential was verified.
///
/// Only [`AdminAuthenticator::verify`] can construct one, so any function
/// taking `&AdminGrant` is reachable only after a successful check.
#[derive(Debug)]
pub struct AdminGrant {
  _private: (),
}

/// Compares presented tokens against the configured admin secret.
#[derive(Clone)]
pub struct AdminAuthenticator {
  secret_digest: [u8; 32],
  fallback:      bool,
}

impl AdminAuthenticator {
  pub fn new(secret: impl AsRef<[u8]>) -> Self {
    Self { secret_digest: digest(secret.as_ref()), fallback: false }
  }

  /// Build from an optional configured secret, falling back to
  /// [`DEFAULT_ADMIN_TOKEN`]. Blank secrets count as unset.
  pub fn from_config(secret: Option<&str>) -> Self {
    match secret.map(str::trim).filter(|s| !s.is_empty()) {
      Some(s) => Self::new(s),
      None => {
        tracing::warn!(
          "no admin token configured; using the built-in default. \
           Set BEACON_ADMIN_TOKEN before exposing this server."
        );
        Self { fallback: true, ..Self::new(DEFAULT_ADMIN_TOKEN) }
      }
    }
  }

  /// True when the built-in default secret is in effect.
  pub fn is_fallback(&self) -> bool { self.fallback }

  /// Check `presented` against the secret in constant time.
  ///
  /// Both sides are hashed first so the comparison runs over equal-length
  /// digests whatever the presented length.
  pub fn verify(&self, presented: &str) -> Result<AdminGrant> {
    if constant_time_eq(&digest(presented.as_bytes()), &self.secret_digest) {
      Ok(AdminGrant { _private: () })
    } else {
      tracing::warn!("rejected admin credential");
      Err(Error::Unauthorized)
    }
  }
}

impl std::fmt::Debug for AdminAuthenticator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AdminAuthenticator")
      .field("fallback", &self.fallback)
      .finish_non_exhaustive()
  }
}

fn digest(bytes: &[u8]) -> [u8; 32] { Sha256::digest(bytes).into() }

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
  let diff = a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y));
  std::hint::black_box(diff) == 0
}

//! Error taxonomy shared by the service layer.

use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  /// Input failed validation; carries one entry per offending field.
  #[error("invalid location: {0}")]
  InvalidLocation(ValidationErrors),

  /// Device registration failed validation.
  #[error("invalid device: {0}")]
  InvalidDevice(ValidationErrors),

  /// Missing or wrong admin credential.
  #[error("unauthorized")]
  Unauthorized,

  /// No location has been activated yet.
  #[error("no active location")]
  NotFound,

  /// The backing store failed or could not be reached.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageUnavailable(Box::new(e))
  }

  /// Names of the fields that failed validation, sorted.
  pub fn invalid_fields(&self) -> Vec<String> {
    let (Self::InvalidLocation(errors) | Self::InvalidDevice(errors)) = self else {
      return Vec::new();
    };
    let mut fields: Vec<String> =
      errors.field_errors().keys().map(|k| k.to_string()).collect();
    fields.sort();
    fields
  }
}

impl From<beacon_core::Error> for Error {
  fn from(e: beacon_core::Error) -> Self {
    match e {
      beacon_core::Error::Validation(errors) => Self::InvalidLocation(errors),
      other => {
        let mut err = ValidationError::new("coordinate");
        err.message = Some(other.to_string().into());
        let mut errors = ValidationErrors::new();
        errors.add("coordinates", err);
        Self::InvalidLocation(errors)
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

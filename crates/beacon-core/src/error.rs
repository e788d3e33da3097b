//! Error types for `beacon-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid coordinate: {0:?}")]
  InvalidCoordinate(String),

  #[error("coordinate out of range: {0}")]
  CoordinateOutOfRange(f64),

  #[error("validation failed: {0}")]
  Validation(#[from] validator::ValidationErrors),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

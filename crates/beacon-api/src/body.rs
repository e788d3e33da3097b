//! Field-by-field reading of JSON request bodies.
//!
//! Bodies are taken as a [`serde_json::Value`] and read through [`Fields`],
//! so a missing or mistyped field becomes one entry in a
//! [`ValidationErrors`] next to any range or blank-string failures, instead
//! of a single serde message naming only the first problem.

use std::borrow::Cow;

use serde_json::{Map, Value};
use validator::{ValidationError, ValidationErrors};

use crate::error::ApiError;

pub struct Fields<'a> {
  object: &'a Map<String, Value>,
  errors: ValidationErrors,
}

fn field_error(code: &'static str, message: String) -> ValidationError {
  let mut err = ValidationError::new(code);
  err.message = Some(Cow::Owned(message));
  err
}

impl<'a> Fields<'a> {
  pub fn of(body: &'a Value) -> Result<Self, ApiError> {
    match body {
      Value::Object(object) => Ok(Self { object, errors: ValidationErrors::new() }),
      _ => Err(ApiError::BadRequest("Request body must be a JSON object".to_owned())),
    }
  }

  fn required(&mut self, field: &'static str) -> Option<&'a Value> {
    match self.object.get(field) {
      None | Some(Value::Null) => {
        self.errors.add(field, field_error("required", format!("{field} is required")));
        None
      }
      Some(v) => Some(v),
    }
  }

  fn wrong_type(&mut self, field: &'static str, expected: &str) {
    self.errors.add(field, field_error("type", format!("{field} must be {expected}")));
  }

  pub fn number(&mut self, field: &'static str) -> Option<f64> {
    let value = self.required(field)?;
    let n = value.as_f64();
    if n.is_none() {
      self.wrong_type(field, "a number");
    }
    n
  }

  pub fn string(&mut self, field: &'static str) -> Option<String> {
    let value = self.required(field)?;
    let s = value.as_str().map(str::to_owned);
    if s.is_none() {
      self.wrong_type(field, "a string");
    }
    s
  }

  /// Absent and `null` are both `None`; anything but a string is an error.
  pub fn optional_string(&mut self, field: &'static str) -> Option<String> {
    match self.object.get(field) {
      None | Some(Value::Null) => None,
      Some(Value::String(s)) => Some(s.clone()),
      Some(_) => {
        self.wrong_type(field, "a string");
        None
      }
    }
  }

  /// Record the outcome of a value check against `field`.
  pub fn check(&mut self, field: &'static str, outcome: Result<(), ValidationError>) {
    if let Err(e) = outcome {
      self.errors.add(field, e);
    }
  }

  /// `value` if every field was present, well typed and passed its checks.
  pub fn finish<T>(self, what: &'static str, value: Option<T>) -> Result<T, ApiError> {
    match value {
      Some(v) if self.errors.is_empty() => Ok(v),
      _ => Err(ApiError::Validation(what, self.errors)),
    }
  }
}

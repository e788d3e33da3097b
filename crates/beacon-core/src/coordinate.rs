//! Fixed-point decimal degrees.
//!
//! Latitudes and longitudes are held as integer multiples of 10⁻⁸ degree so
//! that a value written by the admin is read back digit-for-digit. On the wire
//! a [`Coordinate`] is a decimal string with exactly eight fractional digits
//! (`"12.97160000"`); numbers are accepted on input.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

/// Number of fractional decimal digits kept.
pub const SCALE_DIGITS: u32 = 8;

const SCALE: i64 = 10_i64.pow(SCALE_DIGITS);

/// A latitude or longitude in fixed-point decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate(i64);

impl Coordinate {
  /// Build from raw units of 10⁻⁸ degree.
  pub const fn from_units(units: i64) -> Self { Self(units) }

  pub const fn units(self) -> i64 { self.0 }

  /// Round a floating-point degree value to the nearest representable unit.
  ///
  /// Fails for NaN, infinities and anything beyond ±360°, which no caller
  /// can legitimately produce.
  pub fn from_degrees(degrees: f64) -> Result<Self> {
    if !degrees.is_finite() || degrees.abs() > 360.0 {
      return Err(Error::CoordinateOutOfRange(degrees));
    }
    Ok(Self((degrees * SCALE as f64).round() as i64))
  }

  pub fn to_degrees(self) -> f64 { self.0 as f64 / SCALE as f64 }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    let scale = SCALE as u64;
    write!(
      f,
      "{sign}{}.{:0width$}",
      abs / scale,
      abs % scale,
      width = SCALE_DIGITS as usize
    )
  }
}

impl FromStr for Coordinate {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidCoordinate(s.to_owned());

    let trimmed = s.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
      Some(rest) => (true, rest),
      None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty()
      || !int_part.bytes().all(|b| b.is_ascii_digit())
      || !frac_part.bytes().all(|b| b.is_ascii_digit())
      || frac_part.len() > SCALE_DIGITS as usize
    {
      return Err(invalid());
    }

    let whole: i64 = int_part.parse().map_err(|_| invalid())?;
    let frac: i64 = if frac_part.is_empty() {
      0
    } else {
      let padding = SCALE_DIGITS - frac_part.len() as u32;
      frac_part.parse::<i64>().map_err(|_| invalid())? * 10_i64.pow(padding)
    };

    let units = whole
      .checked_mul(SCALE)
      .and_then(|w| w.checked_add(frac))
      .ok_or_else(invalid)?;

    Ok(Self(if negative { -units } else { units }))
  }
}

impl Serialize for Coordinate {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Coordinate {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(CoordinateVisitor)
  }
}

struct CoordinateVisitor;

impl de::Visitor<'_> for CoordinateVisitor {
  type Value = Coordinate;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a decimal degree as a string or number")
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<Coordinate, E> {
    v.parse().map_err(E::custom)
  }

  fn visit_f64<E: de::Error>(self, v: f64) -> Result<Coordinate, E> {
    Coordinate::from_degrees(v).map_err(E::custom)
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<Coordinate, E> {
    self.visit_f64(v as f64)
  }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<Coordinate, E> {
    self.visit_f64(v as f64)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_pads_eight_fraction_digits() {
    let c = Coordinate::from_degrees(12.9716).unwrap();
    assert_eq!(c.to_string(), "12.97160000");
    assert_eq!(Coordinate::from_units(-50_000_000).to_string(), "-0.50000000");
    assert_eq!(Coordinate::from_units(0).to_string(), "0.00000000");
  }

  #[test]
  fn parse_accepts_short_fractions_and_signs() {
    assert_eq!("77.5946".parse::<Coordinate>().unwrap().units(), 7_759_460_000);
    assert_eq!("-180".parse::<Coordinate>().unwrap().units(), -18_000_000_000);
    assert_eq!("+0.1".parse::<Coordinate>().unwrap().units(), 10_000_000);
  }

  #[test]
  fn parse_rejects_garbage() {
    for bad in ["", "-", "1.2.3", "abc", "1.123456789", ".5", "1e3"] {
      assert!(bad.parse::<Coordinate>().is_err(), "{bad:?} should not parse");
    }
  }

  #[test]
  fn from_degrees_rejects_non_finite() {
    assert!(Coordinate::from_degrees(f64::NAN).is_err());
    assert!(Coordinate::from_degrees(f64::INFINITY).is_err());
  }

  #[test]
  fn json_is_a_string_and_numbers_are_accepted() {
    let c = Coordinate::from_degrees(-33.8688).unwrap();
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, "\"-33.86880000\"");

    let from_str: Coordinate = serde_json::from_str(&json).unwrap();
    let from_num: Coordinate = serde_json::from_str("-33.8688").unwrap();
    assert_eq!(from_str, c);
    assert_eq!(from_num, c);
  }
}

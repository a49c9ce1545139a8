//! Postcode reference data.

use serde::{Deserialize, Serialize};

/// Coordinates stored for an address whose postcode is not in the reference
/// table; `lat`/`lon` are never NULL.
pub const UNKNOWN_COORDINATES: Coordinates = Coordinates { latitude: 0.0, longitude: 0.0 };

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

/// One row of the postcode reference file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostcodeCoordinate {
  /// Normalized postcode; see [`normalize`].
  pub postcode:  String,
  pub latitude:  f64,
  pub longitude: f64,
}

impl PostcodeCoordinate {
  pub fn new(postcode: &str, latitude: f64, longitude: f64) -> Self {
    Self { postcode: normalize(postcode), latitude, longitude }
  }

  pub fn coordinates(&self) -> Coordinates {
    Coordinates { latitude: self.latitude, longitude: self.longitude }
  }
}

/// Canonical lookup key for a postcode: uppercased with all whitespace
/// removed, so `"ls1 4ap"` and `"LS14AP"` resolve to the same row.
pub fn normalize(postcode: &str) -> String {
  postcode
    .chars()
    .filter(|c| !c.is_whitespace())
    .flat_map(char::to_uppercase)
    .collect()
}

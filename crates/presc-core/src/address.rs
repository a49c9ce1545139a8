//! Practice address rows.
//!
//! An address extract lists every practice open in one reporting period. Each
//! row realizes one practice at that period; `(period, practice_ref)` is its
//! identity and the store keeps at most one row per identity.

use serde::{Deserialize, Serialize};

use crate::{
  period::Period,
  postcode::{Coordinates, normalize},
};

/// An address row as read from an extract, before coordinate enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAddress {
  pub period:        Period,
  pub practice_ref:  String,
  pub title:         String,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city:          Option<String>,
  pub county:        Option<String>,
  pub area:          Option<String>,
  pub postcode:      String,
}

impl NewAddress {
  /// The key used to resolve this row's coordinates.
  pub fn lookup_key(&self) -> String { normalize(&self.postcode) }
}

/// A stored address row, enriched with coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
  /// Store-assigned row id; the target of prescription links.
  pub id:            i64,
  pub period:        Period,
  pub practice_ref:  String,
  pub title:         String,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city:          Option<String>,
  pub county:        Option<String>,
  pub area:          Option<String>,
  pub postcode:      String,
  pub latitude:      f64,
  pub longitude:     f64,
}

impl AddressRecord {
  pub fn coordinates(&self) -> Coordinates {
    Coordinates { latitude: self.latitude, longitude: self.longitude }
  }
}

/// The id and name of a practice at one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSummary {
  pub id:    i64,
  pub title: String,
}

/// The latest period for which a practice has an address row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPractice {
  pub period: Period,
  pub title:  String,
}

//! Prescription rows.
//!
//! A prescription extract holds every item prescribed by one practice in one
//! period. Rows carry no identity of their own; each is linked at ingestion
//! time to the address row sharing its `(practice_ref, period)`.

use serde::{Deserialize, Serialize};

use crate::period::Period;

/// Link value for a prescription whose practice has no address row, or whose
/// period is missing or unparseable.
pub const UNKNOWN_PRACTICE: i64 = 0;

/// A prescription row as read from an extract. Empty fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPrescription {
  pub sha:          Option<String>,
  pub pct:          Option<String>,
  pub practice_ref: String,
  pub bnf_code:     Option<String>,
  pub bnf_name:     Option<String>,
  pub items:        Option<i64>,
  pub nic:          Option<f64>,
  pub act_cost:     Option<f64>,
  pub quantity:     Option<i64>,
  /// Kept verbatim; a malformed period is stored but links to
  /// [`UNKNOWN_PRACTICE`].
  pub period:       Option<String>,
  pub extra:        Option<String>,
}

impl NewPrescription {
  /// The period to resolve the practice link against, if it is valid.
  pub fn link_period(&self) -> Option<Period> {
    self.period.as_deref().and_then(|p| Period::parse(p).ok())
  }
}

/// A stored prescription row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
  pub id:         i64,
  #[serde(flatten)]
  pub row:        NewPrescription,
  /// Id of the linked address row, or [`UNKNOWN_PRACTICE`].
  pub address_id: i64,
}

impl PrescriptionRecord {
  pub fn is_linked(&self) -> bool { self.address_id != UNKNOWN_PRACTICE }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn link_period_requires_valid_period() {
    let mut row = NewPrescription {
      practice_ref: "A81001".into(),
      period: Some("201012".into()),
      ..Default::default()
    };
    assert_eq!(row.link_period().unwrap().as_str(), "201012");

    row.period = Some("DEC10".into());
    assert!(row.link_period().is_none());

    row.period = None;
    assert!(row.link_period().is_none());
  }
}

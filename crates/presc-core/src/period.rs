//! Reporting periods.
//!
//! Every extract covers a single calendar month, written `YYYYMM`. The period
//! is part of the identity of both address and prescription rows.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A validated six-character `YYYYMM` reporting month.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
  pub fn parse(s: &str) -> Result<Self> {
    let s = s.trim();
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::InvalidPeriod(s.to_owned()));
    }
    // Both halves are ASCII digits at this point.
    let year: i32 = s[..4].parse().map_err(|_| Error::InvalidPeriod(s.to_owned()))?;
    let month: u32 = s[4..].parse().map_err(|_| Error::InvalidPeriod(s.to_owned()))?;
    NaiveDate::from_ymd_opt(year, month, 1)
      .ok_or_else(|| Error::InvalidPeriod(s.to_owned()))?;
    Ok(Self(s.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for Period {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for Period {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<Period> for String {
  fn from(p: Period) -> Self { p.0 }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_valid_month() {
    let p = Period::parse("202301").unwrap();
    assert_eq!(p.as_str(), "202301");
    assert_eq!(p.to_string(), "202301");
  }

  #[test]
  fn trims_surrounding_whitespace() {
    assert_eq!(Period::parse(" 201012 ").unwrap().as_str(), "201012");
  }

  #[test]
  fn rejects_bad_shapes() {
    for bad in ["", "2023", "2023011", "2023-1", "abcdef", "202300", "202313"] {
      assert!(
        matches!(Period::parse(bad), Err(Error::InvalidPeriod(_))),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn periods_order_chronologically() {
    let a = Period::parse("201912").unwrap();
    let b = Period::parse("202001").unwrap();
    assert!(a < b);
  }
}

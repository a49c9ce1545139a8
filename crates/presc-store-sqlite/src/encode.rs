//! Row shapes read back from SQLite and their conversion into domain types.
//!
//! Periods are stored as plain `YYYYMM` text and re-validated on the way out.

use presc_core::{
  address::{AddressRecord, LatestPractice},
  period::Period,
  prescription::{NewPrescription, PrescriptionRecord},
};

use crate::Result;

// ─── Column lists ─────────────────────────────────────────────────────────────

pub const ADDRESS_COLUMNS: &str = "id, period, practice_ref, title, address_line1, \
   address_line2, city, county, area, postcode, lat, lon";

pub const PRESCRIPTION_COLUMNS: &str = "id, sha, pct, practice_ref, bnf_code, bnf_name, \
   items, nic, act_cost, quantity, period, extra, address_id";

// ─── Addresses ────────────────────────────────────────────────────────────────

pub struct RawAddress {
  pub id:            i64,
  pub period:        String,
  pub practice_ref:  String,
  pub title:         String,
  pub address_line1: String,
  pub address_line2: Option<String>,
  pub city:          Option<String>,
  pub county:        Option<String>,
  pub area:          Option<String>,
  pub postcode:      String,
  pub lat:           f64,
  pub lon:           f64,
}

impl RawAddress {
  /// Read a row selected with [`ADDRESS_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      period:        row.get(1)?,
      practice_ref:  row.get(2)?,
      title:         row.get(3)?,
      address_line1: row.get(4)?,
      address_line2: row.get(5)?,
      city:          row.get(6)?,
      county:        row.get(7)?,
      area:          row.get(8)?,
      postcode:      row.get(9)?,
      lat:           row.get(10)?,
      lon:           row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<AddressRecord> {
    Ok(AddressRecord {
      id:            self.id,
      period:        Period::parse(&self.period)?,
      practice_ref:  self.practice_ref,
      title:         self.title,
      address_line1: self.address_line1,
      address_line2: self.address_line2,
      city:          self.city,
      county:        self.county,
      area:          self.area,
      postcode:      self.postcode,
      latitude:      self.lat,
      longitude:     self.lon,
    })
  }
}

pub struct RawLatest {
  pub period: String,
  pub title:  String,
}

impl RawLatest {
  pub fn into_latest(self) -> Result<LatestPractice> {
    Ok(LatestPractice { period: Period::parse(&self.period)?, title: self.title })
  }
}

// ─── Prescriptions ────────────────────────────────────────────────────────────

/// Read a row selected with [`PRESCRIPTION_COLUMNS`].
pub fn prescription_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrescriptionRecord> {
  Ok(PrescriptionRecord {
    id:         row.get(0)?,
    row:        NewPrescription {
      sha:          row.get(1)?,
      pct:          row.get(2)?,
      practice_ref: row.get(3)?,
      bnf_code:     row.get(4)?,
      bnf_name:     row.get(5)?,
      items:        row.get(6)?,
      nic:          row.get(7)?,
      act_cost:     row.get(8)?,
      quantity:     row.get(9)?,
      period:       row.get(10)?,
      extra:        row.get(11)?,
    },
    address_id: row.get(12)?,
  })
}

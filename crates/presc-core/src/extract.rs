//! CSV extract readers.
//!
//! Each reader validates rows into named record types at the boundary, so the
//! store only ever sees well-formed data. Fields are whitespace-trimmed and an
//! empty field is treated as absent.
//!
//! | extract      | header        | columns                                              |
//! |--------------|---------------|------------------------------------------------------|
//! | postcodes    | optional      | `postcode,latitude,longitude`                        |
//! | addresses    | optional      | `period,practice_ref,title,line1,line2,city,county,postcode[,area]` |
//! | prescriptions| required      | `sha,pct,practice,bnf_code,bnf_name,items,nic,act_cost,quantity,period,extra` |

use std::{fs::File, io::Read, path::Path, str::FromStr};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
  Error, Result,
  address::NewAddress,
  period::Period,
  postcode::PostcodeCoordinate,
  prescription::NewPrescription,
};

// ─── Extract types ───────────────────────────────────────────────────────────

/// All rows of one period's address extract.
#[derive(Debug, Clone)]
pub struct AddressExtract {
  /// Period taken from the first data row; every row shares it.
  pub period: Period,
  pub rows:   Vec<NewAddress>,
}

/// All rows of one practice's prescription extract for one period.
#[derive(Debug, Clone)]
pub struct PrescriptionExtract {
  /// Practice and period taken from the first data row.
  pub practice_ref: String,
  pub period:       Option<String>,
  pub rows:         Vec<NewPrescription>,
}

// ─── Path validation ─────────────────────────────────────────────────────────

/// Check that `path` names an existing `.csv` file.
pub fn check_extract_path(path: &Path) -> Result<()> {
  let is_csv = path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
  if !is_csv {
    return Err(Error::BadFileType(path.to_path_buf()));
  }
  if !path.is_file() {
    return Err(Error::FileNotFound(path.to_path_buf()));
  }
  Ok(())
}

fn open(path: &Path) -> Result<File> {
  File::open(path).map_err(|e| match e.kind() {
    std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
    _ => Error::Io(e),
  })
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn line_of(rec: &StringRecord) -> u64 {
  rec.position().map(|p| p.line()).unwrap_or_default()
}

fn optional(rec: &StringRecord, idx: usize) -> Option<String> {
  rec
    .get(idx)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

fn required(rec: &StringRecord, idx: usize, name: &str) -> Result<String> {
  optional(rec, idx).ok_or_else(|| Error::MalformedRow {
    line:   line_of(rec),
    reason: format!("missing {name} (column {idx})"),
  })
}

fn number<T: FromStr>(rec: &StringRecord, idx: usize, name: &str) -> Result<Option<T>> {
  optional(rec, idx)
    .map(|s| {
      s.parse::<T>().map_err(|_| Error::MalformedRow {
        line:   line_of(rec),
        reason: format!("{name} is not a number: {s:?}"),
      })
    })
    .transpose()
}

fn reader<R: Read>(input: R, has_headers: bool) -> csv::Reader<R> {
  ReaderBuilder::new()
    .has_headers(has_headers)
    .flexible(true)
    .trim(Trim::All)
    .from_reader(input)
}

// ─── Postcodes ───────────────────────────────────────────────────────────────

pub fn read_postcodes(path: &Path) -> Result<Vec<PostcodeCoordinate>> {
  postcodes_from_reader(open(path)?)
}

/// Parse a postcode reference file. A first row whose latitude is not numeric
/// is taken to be a header and skipped.
pub fn postcodes_from_reader<R: Read>(input: R) -> Result<Vec<PostcodeCoordinate>> {
  let mut out = Vec::new();
  for (i, rec) in reader(input, false).records().enumerate() {
    let rec = rec?;
    if i == 0 && number::<f64>(&rec, 1, "latitude").is_err() {
      tracing::debug!("skipping postcode header row");
      continue;
    }
    let postcode = required(&rec, 0, "postcode")?;
    let latitude = number(&rec, 1, "latitude")?;
    let longitude = number(&rec, 2, "longitude")?;
    match (latitude, longitude) {
      (Some(lat), Some(lon)) => out.push(PostcodeCoordinate::new(&postcode, lat, lon)),
      _ => {
        return Err(Error::MalformedRow {
          line:   line_of(&rec),
          reason: format!("postcode {postcode:?} has no coordinates"),
        });
      }
    }
  }
  Ok(out)
}

// ─── Addresses ───────────────────────────────────────────────────────────────

pub fn read_addresses(path: &Path) -> Result<AddressExtract> {
  addresses_from_reader(open(path)?)
}

/// Parse an address extract. Real extracts have no header; a first row whose
/// period field is not a valid `YYYYMM` is taken to be a header and skipped.
pub fn addresses_from_reader<R: Read>(input: R) -> Result<AddressExtract> {
  let mut rows: Vec<NewAddress> = Vec::new();
  for (i, rec) in reader(input, false).records().enumerate() {
    let rec = rec?;
    let parsed = match optional(&rec, 0) {
      Some(raw) => Period::parse(&raw).map(Some),
      None => Ok(None),
    };
    let period = match parsed {
      Ok(Some(p)) => p,
      _ if i == 0 => {
        tracing::debug!("skipping address header row");
        continue;
      }
      Ok(None) => {
        return Err(Error::MalformedRow {
          line:   line_of(&rec),
          reason: "missing period (column 0)".to_owned(),
        });
      }
      Err(e) => return Err(e),
    };
    if let Some(first) = rows.first()
      && first.period != period
    {
      return Err(Error::MalformedRow {
        line:   line_of(&rec),
        reason: format!("period {period} differs from extract period {}", first.period),
      });
    }
    rows.push(NewAddress {
      period,
      practice_ref: required(&rec, 1, "practice_ref")?,
      title: required(&rec, 2, "title")?,
      address_line1: required(&rec, 3, "address_line1")?,
      address_line2: optional(&rec, 4),
      city: optional(&rec, 5),
      county: optional(&rec, 6),
      postcode: required(&rec, 7, "postcode")?,
      area: optional(&rec, 8),
    });
  }
  let period = rows.first().ok_or(Error::EmptyExtract)?.period.clone();
  Ok(AddressExtract { period, rows })
}

// ─── Prescriptions ───────────────────────────────────────────────────────────

pub fn read_prescriptions(path: &Path) -> Result<PrescriptionExtract> {
  prescriptions_from_reader(open(path)?)
}

/// Parse a prescription extract. The first row is always a header.
pub fn prescriptions_from_reader<R: Read>(input: R) -> Result<PrescriptionExtract> {
  let mut rows = Vec::new();
  for rec in reader(input, true).records() {
    let rec = rec?;
    rows.push(NewPrescription {
      sha:          optional(&rec, 0),
      pct:          optional(&rec, 1),
      practice_ref: required(&rec, 2, "practice")?,
      bnf_code:     optional(&rec, 3),
      bnf_name:     optional(&rec, 4),
      items:        number(&rec, 5, "items")?,
      nic:          number(&rec, 6, "nic")?,
      act_cost:     number(&rec, 7, "act_cost")?,
      quantity:     number(&rec, 8, "quantity")?,
      period:       optional(&rec, 9),
      extra:        optional(&rec, 10),
    });
  }
  let first = rows.first().ok_or(Error::EmptyExtract)?;
  Ok(PrescriptionExtract {
    practice_ref: first.practice_ref.clone(),
    period: first.period.clone(),
    rows,
  })
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  #[test]
  fn postcodes_with_and_without_header() {
    let with = "postcode,latitude,longitude\nab1 0aa,57.10,-2.24\nAB10AB,57.12,-2.25\n";
    let without = "AB1 0AA,57.10,-2.24\nAB10AB,57.12,-2.25\n";
    let a = postcodes_from_reader(with.as_bytes()).unwrap();
    let b = postcodes_from_reader(without.as_bytes()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].postcode, "AB10AA");
  }

  #[test]
  fn postcode_without_coordinates_is_malformed() {
    let err = postcodes_from_reader("AB10AA,57.1,\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MalformedRow { line: 1, .. }), "{err}");
  }

  const ADDR: &str = "\
201012,A81001,THE DENSHAM SURGERY,THE HEALTH CENTRE,LAWSON STREET,STOCKTON,CLEVELAND,TS18 1HU
201012,A81002,QUEENS PARK MEDICAL CENTRE,QUEENS PARK MEDICAL CTR,FARRER STREET,STOCKTON ON TEES,,TS18 2AW
";

  #[test]
  fn address_columns_map_to_fields() {
    let ex = addresses_from_reader(ADDR.as_bytes()).unwrap();
    assert_eq!(ex.period.as_str(), "201012");
    assert_eq!(ex.rows.len(), 2);

    let r = &ex.rows[0];
    assert_eq!(r.practice_ref, "A81001");
    assert_eq!(r.title, "THE DENSHAM SURGERY");
    assert_eq!(r.address_line2.as_deref(), Some("LAWSON STREET"));
    assert_eq!(r.county.as_deref(), Some("CLEVELAND"));
    assert_eq!(r.postcode, "TS18 1HU");
    assert_eq!(r.area, None);
    assert_eq!(ex.rows[1].county, None);
  }

  #[test]
  fn address_header_is_skipped() {
    let input = format!("period,ref,title,l1,l2,city,county,postcode\n{ADDR}");
    let ex = addresses_from_reader(input.as_bytes()).unwrap();
    assert_eq!(ex.rows.len(), 2);
  }

  #[test]
  fn address_header_with_blank_first_field_is_skipped() {
    let input = format!(",ref,title,l1,l2,city,county,postcode\n{ADDR}");
    let ex = addresses_from_reader(input.as_bytes()).unwrap();
    assert_eq!(ex.period.as_str(), "201012");
    assert_eq!(ex.rows.len(), 2);
  }

  #[test]
  fn address_missing_period_after_first_row_is_malformed() {
    let input = format!("{ADDR},A81004,X,Y,,,,TS1 1AA\n");
    let err = addresses_from_reader(input.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MalformedRow { line: 3, .. }), "{err}");
  }

  #[test]
  fn address_quotes_survive() {
    let input = "201012,A81003,\"ST MARY'S SURGERY, \"\"NORTH\"\"\",1 HIGH ST,,,,TS1 1AA\n";
    let ex = addresses_from_reader(input.as_bytes()).unwrap();
    assert_eq!(ex.rows[0].title, "ST MARY'S SURGERY, \"NORTH\"");
  }

  #[test]
  fn address_mixed_periods_rejected() {
    let input = format!("{ADDR}201101,A81004,X,Y,,,,TS1 1AA\n");
    let err = addresses_from_reader(input.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MalformedRow { line: 3, .. }), "{err}");
  }

  #[test]
  fn empty_extracts_are_rejected() {
    assert!(matches!(addresses_from_reader("".as_bytes()), Err(Error::EmptyExtract)));
    let header_only = "SHA,PCT,PRACTICE,BNF CODE,BNF NAME,ITEMS,NIC,ACT COST,QUANTITY,PERIOD,\n";
    assert!(matches!(
      prescriptions_from_reader(header_only.as_bytes()),
      Err(Error::EmptyExtract)
    ));
  }

  #[test]
  fn prescription_identity_from_first_data_row() {
    let input = "\
SHA,PCT,PRACTICE,BNF CODE,BNF NAME,ITEMS,NIC,ACT COST,QUANTITY,PERIOD,
Q30,5D7,A86003,0101010G0AAABAB,Co-Magaldrox_Susp 195mg/220mg/5ml S/F,2,5.98,5.56,1000,201012,
Q30,5D7,A86003,0101021B0AAAHAH,Alginate_Raft-Forming Oral Susp S/F,, ,,,201012,
";
    let ex = prescriptions_from_reader(input.as_bytes()).unwrap();
    assert_eq!(ex.practice_ref, "A86003");
    assert_eq!(ex.period.as_deref(), Some("201012"));
    assert_eq!(ex.rows.len(), 2);

    let r = &ex.rows[0];
    assert_eq!(r.items, Some(2));
    assert_eq!(r.nic, Some(5.98));
    assert_eq!(r.quantity, Some(1000));
    assert_eq!(r.extra, None);

    let blank = &ex.rows[1];
    assert_eq!(blank.items, None);
    assert_eq!(blank.nic, None);
    assert_eq!(blank.act_cost, None);
  }

  #[test]
  fn prescription_bad_number_is_malformed() {
    let input = "h\nQ30,5D7,A86003,X,Y,two,1,1,1,201012,\n";
    let err = prescriptions_from_reader(input.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::MalformedRow { line: 2, .. }), "{err}");
  }

  #[test]
  fn extract_path_checks() {
    let err = check_extract_path(Path::new("practices.txt")).unwrap_err();
    assert!(matches!(err, Error::BadFileType(_)));

    let missing = PathBuf::from("definitely/not/here.csv");
    let err = check_extract_path(&missing).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
  }
}

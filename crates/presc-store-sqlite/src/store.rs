//! [`SqliteStore`] — the SQLite implementation of [`PracticeStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use presc_core::{
  address::{AddressRecord, LatestPractice, PracticeSummary},
  extract::{AddressExtract, PrescriptionExtract},
  period::Period,
  postcode::{Coordinates, PostcodeCoordinate, UNKNOWN_COORDINATES, normalize},
  prescription::{PrescriptionRecord, UNKNOWN_PRACTICE},
  store::{Outcome, PracticeStore, ProvisionReport},
};

use crate::{
  Result,
  encode::{
    ADDRESS_COLUMNS, PRESCRIPTION_COLUMNS, RawAddress, RawLatest, prescription_from_row,
  },
  schema::SCHEMA,
};

// ─── Statements ──────────────────────────────────────────────────────────────

const LOOKUP_POSTCODE: &str =
  "SELECT latitude, longitude FROM postcodes WHERE postcode = ?1";

const LOOKUP_ADDRESS_ID: &str =
  "SELECT id FROM addressbook WHERE practice_ref = ?1 AND period = ?2";

// Re-ingesting a period updates rows in place so their ids, and with them any
// prescription links, stay stable.
const UPSERT_ADDRESS: &str = "
  INSERT INTO addressbook (
    period, practice_ref, title, address_line1, address_line2,
    city, county, area, postcode, lat, lon
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
  ON CONFLICT (period, practice_ref) DO UPDATE SET
    title         = excluded.title,
    address_line1 = excluded.address_line1,
    address_line2 = excluded.address_line2,
    city          = excluded.city,
    county        = excluded.county,
    area          = excluded.area,
    postcode      = excluded.postcode,
    lat           = excluded.lat,
    lon           = excluded.lon";

const INSERT_PRESCRIPTION: &str = "
  INSERT INTO prescriptions (
    sha, pct, practice_ref, bnf_code, bnf_name, items,
    nic, act_cost, quantity, period, extra, address_id
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

fn lookup_coordinates(
  conn: &rusqlite::Connection,
  key: &str,
) -> rusqlite::Result<Option<Coordinates>> {
  conn
    .prepare_cached(LOOKUP_POSTCODE)?
    .query_row(rusqlite::params![key], |r| {
      Ok(Coordinates { latitude: r.get(0)?, longitude: r.get(1)? })
    })
    .optional()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A practices & prescriptions store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database at `path`. The schema is not applied
  /// until [`PracticeStore::provision`] is called.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn postcode_count(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM postcodes", [], |r| r.get(0))?)
      })
      .await?;
    Ok(count as usize)
  }

  async fn import_postcodes(&self, postcodes: Vec<PostcodeCoordinate>) -> Result<usize> {
    let imported = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut imported = 0;
        {
          // Duplicate keys in the reference file keep their first occurrence.
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO postcodes (postcode, latitude, longitude)
             VALUES (?1, ?2, ?3)",
          )?;
          for pc in &postcodes {
            imported +=
              stmt.execute(rusqlite::params![pc.postcode, pc.latitude, pc.longitude])?;
          }
        }
        tx.commit()?;
        Ok(imported)
      })
      .await?;
    Ok(imported)
  }
}

// ─── PracticeStore impl ──────────────────────────────────────────────────────

impl PracticeStore for SqliteStore {
  type Error = crate::Error;

  // ── Provisioning ──────────────────────────────────────────────────────────

  async fn provision<F>(&self, load_postcodes: F) -> Result<ProvisionReport>
  where
    F: FnOnce() -> presc_core::Result<Vec<PostcodeCoordinate>> + Send + 'static,
  {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::info!("schema ready");

    let existing = self.postcode_count().await?;
    if existing > 0 {
      tracing::info!(existing, "postcodes already imported");
      return Ok(ProvisionReport { postcodes_imported: None });
    }

    let postcodes = tokio::task::spawn_blocking(load_postcodes).await??;
    let imported = self.import_postcodes(postcodes).await?;
    tracing::info!(imported, "postcodes imported");

    Ok(ProvisionReport { postcodes_imported: Some(imported) })
  }

  // ── Lookups ───────────────────────────────────────────────────────────────

  async fn lookup_postcode(&self, postcode: &str) -> Result<Option<Coordinates>> {
    let key = normalize(postcode);
    let coords = self
      .conn
      .call(move |conn| Ok(lookup_coordinates(conn, &key)?))
      .await?;
    Ok(coords)
  }

  async fn practice_id(
    &self,
    practice_ref: &str,
    period: &Period,
  ) -> Result<Option<PracticeSummary>> {
    let practice_ref = practice_ref.to_owned();
    let period = period.to_string();

    let summary = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, title FROM addressbook WHERE practice_ref = ?1 AND period = ?2",
            rusqlite::params![practice_ref, period],
            |r| Ok(PracticeSummary { id: r.get(0)?, title: r.get(1)? }),
          )
          .optional()?)
      })
      .await?;
    Ok(summary)
  }

  async fn practice_details(
    &self,
    practice_ref: &str,
    period: &Period,
  ) -> Result<Option<AddressRecord>> {
    let practice_ref = practice_ref.to_owned();
    let period = period.to_string();

    let raw: Option<RawAddress> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ADDRESS_COLUMNS} FROM addressbook
               WHERE practice_ref = ?1 AND period = ?2"
            ),
            rusqlite::params![practice_ref, period],
            RawAddress::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAddress::into_record).transpose()
  }

  async fn most_recent_practice(&self, practice_ref: &str) -> Result<Option<LatestPractice>> {
    let practice_ref = practice_ref.to_owned();

    let raw: Option<RawLatest> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT period, title FROM addressbook
             WHERE practice_ref = ?1
             ORDER BY period DESC
             LIMIT 1",
            rusqlite::params![practice_ref],
            |r| Ok(RawLatest { period: r.get(0)?, title: r.get(1)? }),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawLatest::into_latest).transpose()
  }

  async fn address_count(&self, period: &Period) -> Result<usize> {
    let period = period.to_string();
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM addressbook WHERE period = ?1",
          rusqlite::params![period],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count as usize)
  }

  async fn prescriptions(
    &self,
    practice_ref: &str,
    period: &Period,
  ) -> Result<Vec<PrescriptionRecord>> {
    let practice_ref = practice_ref.to_owned();
    let period = period.to_string();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions
           WHERE practice_ref = ?1 AND period = ?2
           ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![practice_ref, period], prescription_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  // ── Ingestion ─────────────────────────────────────────────────────────────

  async fn ingest_addresses(&self, extract: AddressExtract) -> Result<Outcome> {
    let AddressExtract { period, rows } = extract;
    let period_str = period.to_string();
    let file_rows = rows.len();

    let (stored, outcome) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let stored: i64 = tx.query_row(
          "SELECT COUNT(*) FROM addressbook WHERE period = ?1",
          rusqlite::params![period_str],
          |r| r.get(0),
        )?;
        let stored = stored as usize;
        if stored > 0 && stored == rows.len() {
          return Ok((stored, Outcome::AlreadyPresent));
        }

        let mut unlocated = 0usize;
        {
          let mut upsert = tx.prepare(UPSERT_ADDRESS)?;
          for row in &rows {
            let coords = match lookup_coordinates(&tx, &row.lookup_key())? {
              Some(c) => c,
              None => {
                unlocated += 1;
                UNKNOWN_COORDINATES
              }
            };
            upsert.execute(rusqlite::params![
              row.period.as_str(),
              row.practice_ref,
              row.title,
              row.address_line1,
              row.address_line2,
              row.city,
              row.county,
              row.area,
              row.postcode,
              coords.latitude,
              coords.longitude,
            ])?;
          }
        }
        tx.commit()?;

        if unlocated > 0 {
          tracing::warn!(unlocated, "postcodes not found; coordinates set to 0,0");
        }
        Ok((stored, Outcome::Inserted { rows: rows.len() }))
      })
      .await?;

    match outcome {
      Outcome::AlreadyPresent => {
        tracing::info!(%period, stored, "period already loaded");
      }
      Outcome::Inserted { rows } if stored > 0 => {
        tracing::warn!(
          %period,
          stored,
          file_rows,
          "stored row count differs from extract; rows upserted"
        );
        tracing::info!(%period, rows, "addresses written");
      }
      Outcome::Inserted { rows } => {
        tracing::info!(%period, rows, "addresses written");
      }
    }
    Ok(outcome)
  }

  async fn ingest_prescriptions(&self, extract: PrescriptionExtract) -> Result<Outcome> {
    let PrescriptionExtract { practice_ref, period, rows } = extract;
    let log_ref = practice_ref.clone();
    let log_period = period.clone().unwrap_or_default();

    let (outcome, unlinked) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // `IS` so an extract without a period still matches its own rows.
        let exists = tx
          .query_row(
            "SELECT 1 FROM prescriptions
             WHERE practice_ref = ?1 AND period IS ?2
             LIMIT 1",
            rusqlite::params![practice_ref, period],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok((Outcome::AlreadyPresent, 0));
        }

        let mut unlinked = 0usize;
        {
          let mut link = tx.prepare(LOOKUP_ADDRESS_ID)?;
          let mut insert = tx.prepare(INSERT_PRESCRIPTION)?;
          for row in &rows {
            let address_id = match row.link_period() {
              Some(p) => link
                .query_row(rusqlite::params![row.practice_ref, p.as_str()], |r| r.get(0))
                .optional()?,
              None => None,
            };
            let address_id: i64 = address_id.unwrap_or_else(|| {
              unlinked += 1;
              UNKNOWN_PRACTICE
            });
            insert.execute(rusqlite::params![
              row.sha,
              row.pct,
              row.practice_ref,
              row.bnf_code,
              row.bnf_name,
              row.items,
              row.nic,
              row.act_cost,
              row.quantity,
              row.period,
              row.extra,
              address_id,
            ])?;
          }
        }
        tx.commit()?;
        Ok((Outcome::Inserted { rows: rows.len() }, unlinked))
      })
      .await?;

    match outcome {
      Outcome::AlreadyPresent => {
        tracing::info!(practice = %log_ref, period = %log_period, "prescriptions already loaded");
      }
      Outcome::Inserted { rows } => {
        if unlinked > 0 {
          tracing::warn!(
            practice = %log_ref,
            period = %log_period,
            unlinked,
            "prescriptions with no matching practice address"
          );
        }
        tracing::info!(practice = %log_ref, period = %log_period, rows, "prescriptions written");
      }
    }
    Ok(outcome)
  }
}

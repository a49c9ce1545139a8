//! The `PracticeStore` trait and its result types.
//!
//! The trait is implemented by storage backends (e.g. `presc-store-sqlite`).
//! The command shell depends on this abstraction, not on a concrete backend.

use std::future::Future;

use crate::{
  address::{AddressRecord, LatestPractice, PracticeSummary},
  extract::{AddressExtract, PrescriptionExtract},
  period::Period,
  postcode::{Coordinates, PostcodeCoordinate},
  prescription::PrescriptionRecord,
};

// ─── Results ─────────────────────────────────────────────────────────────────

/// Result of an ingestion that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// The extract was written; `rows` is the number of rows inserted or
  /// updated.
  Inserted { rows: usize },
  /// The extract's data is already stored; nothing was written.
  AlreadyPresent,
}

/// What [`PracticeStore::provision`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
  /// Number of postcodes imported, or `None` if the reference table was
  /// already populated and the import was skipped.
  pub postcodes_imported: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a backing store for practices and prescriptions.
///
/// Address rows are never deleted. Every ingestion runs in a single
/// transaction: either all of an extract's rows are committed or none are.
pub trait PracticeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Provisioning ──────────────────────────────────────────────────────

  /// Create the schema if absent, then import the postcode reference table
  /// if it is empty. `load_postcodes` is only called when an import is due.
  fn provision<F>(
    &self,
    load_postcodes: F,
  ) -> impl Future<Output = Result<ProvisionReport, Self::Error>> + Send + '_
  where
    F: FnOnce() -> crate::Result<Vec<PostcodeCoordinate>> + Send + 'static;

  // ── Lookups ───────────────────────────────────────────────────────────

  /// Resolve a postcode to its coordinates. The postcode is normalized
  /// before lookup.
  fn lookup_postcode<'a>(
    &'a self,
    postcode: &'a str,
  ) -> impl Future<Output = Result<Option<Coordinates>, Self::Error>> + Send + 'a;

  /// Id and title of a practice at one period.
  fn practice_id<'a>(
    &'a self,
    practice_ref: &'a str,
    period: &'a Period,
  ) -> impl Future<Output = Result<Option<PracticeSummary>, Self::Error>> + Send + 'a;

  /// Full address row of a practice at one period.
  fn practice_details<'a>(
    &'a self,
    practice_ref: &'a str,
    period: &'a Period,
  ) -> impl Future<Output = Result<Option<AddressRecord>, Self::Error>> + Send + 'a;

  /// The latest period on record for a practice, with its title then.
  fn most_recent_practice<'a>(
    &'a self,
    practice_ref: &'a str,
  ) -> impl Future<Output = Result<Option<LatestPractice>, Self::Error>> + Send + 'a;

  /// Number of address rows stored for a period.
  fn address_count<'a>(
    &'a self,
    period: &'a Period,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// All prescription rows of a practice at one period.
  fn prescriptions<'a>(
    &'a self,
    practice_ref: &'a str,
    period: &'a Period,
  ) -> impl Future<Output = Result<Vec<PrescriptionRecord>, Self::Error>> + Send + 'a;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Store one period's address extract unless that period is already fully
  /// loaded (stored row count equals the extract's row count).
  fn ingest_addresses(
    &self,
    extract: AddressExtract,
  ) -> impl Future<Output = Result<Outcome, Self::Error>> + Send + '_;

  /// Store a prescription extract unless its `(practice, period)` is already
  /// present.
  fn ingest_prescriptions(
    &self,
    extract: PrescriptionExtract,
  ) -> impl Future<Output = Result<Outcome, Self::Error>> + Send + '_;
}

//! Core types and trait definitions for the practices & prescriptions loader.
//!
//! This crate is free of database dependencies. It owns the record types, the
//! CSV extract readers and the [`PracticeStore`](store::PracticeStore) trait
//! implemented by storage backends.

pub mod address;
pub mod error;
pub mod extract;
pub mod period;
pub mod postcode;
pub mod prescription;
pub mod store;

pub use error::{Error, Result};

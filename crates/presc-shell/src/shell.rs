//! Command dispatch.
//!
//! Every command writes one or more human-readable status lines. Store and
//! extract errors are reported and swallowed here; only failures to write to
//! the operator's terminal propagate.

use std::{io::Write, path::Path};

use presc_core::{
  Error as CoreError,
  extract::{check_extract_path, read_addresses, read_postcodes, read_prescriptions},
  period::Period,
  store::{Outcome, PracticeStore},
};

use crate::{
  command::{COMMANDS, Command, syntax},
  settings::Settings,
};

/// Whether the read loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  Continue,
  Quit,
}

pub struct Shell<S: PracticeStore> {
  store:    S,
  settings: Settings,
}

impl<S: PracticeStore> Shell<S> {
  pub fn new(store: S, settings: Settings) -> Self { Self { store, settings } }

  pub async fn execute(&self, cmd: Command, out: &mut impl Write) -> std::io::Result<Control> {
    match cmd {
      Command::Nothing => {}
      Command::Create => self.create(out).await?,
      Command::AddPractice(arg) => self.add_practice(&arg, out).await?,
      Command::AddPresc(arg) => self.add_presc(&arg, out).await?,
      Command::Coords(postcode) => self.coords(&postcode, out).await?,
      Command::Practice { practice_ref, period } => {
        self.practice(&practice_ref, period.as_ref(), out).await?
      }
      Command::Help(topic) => help(topic.as_deref(), out)?,
      Command::Quit => return Ok(Control::Quit),
    }
    Ok(Control::Continue)
  }

  async fn create(&self, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Creating database...")?;
    let pc = self.settings.pc.clone();
    match self.store.provision(move || read_postcodes(&pc)).await {
      Ok(report) => {
        match report.postcodes_imported {
          Some(n) => writeln!(out, "\tinserting postcodes\t{n} imported")?,
          None => writeln!(out, "\tpostcodes checked\talready present")?,
        }
        writeln!(out, "Done")
      }
      Err(e) => store_error(e, out),
    }
  }

  /// Resolve and validate an extract argument, printing why it was rejected.
  fn extract_path(
    &self,
    command: &str,
    arg: &str,
    out: &mut impl Write,
  ) -> std::io::Result<Option<std::path::PathBuf>> {
    let path = self.settings.resolve_extract(arg);
    match check_extract_path(&path) {
      Ok(()) => Ok(Some(path)),
      Err(CoreError::BadFileType(_)) => {
        writeln!(out, "Syntax: {}", syntax(command).unwrap_or(command))?;
        Ok(None)
      }
      Err(CoreError::FileNotFound(_)) => {
        writeln!(out, "This file does not exist")?;
        Ok(None)
      }
      Err(e) => {
        writeln!(out, "Cannot use {arg}: {e}")?;
        Ok(None)
      }
    }
  }

  async fn add_practice(&self, arg: &str, out: &mut impl Write) -> std::io::Result<()> {
    let Some(path) = self.extract_path("addpractice", arg, out)? else {
      return Ok(());
    };
    writeln!(out, "Reading csv and checking db...")?;
    let extract = match read_addresses(&path) {
      Ok(x) => x,
      Err(e) => return extract_error(&path, e, out),
    };
    let period = extract.period.clone();

    match self.store.ingest_addresses(extract).await {
      Ok(Outcome::Inserted { rows }) => {
        writeln!(out, "Inserted {rows} practices for period {period}")?;
        match self.store.address_count(&period).await {
          Ok(stored) => writeln!(out, "\t{stored} practices now stored for {period}")?,
          Err(e) => store_error(e, out)?,
        }
        writeln!(out, "Done")
      }
      Ok(Outcome::AlreadyPresent) => {
        writeln!(out, "This time period has already been inserted into database")
      }
      Err(e) => store_error(e, out),
    }
  }

  async fn add_presc(&self, arg: &str, out: &mut impl Write) -> std::io::Result<()> {
    let Some(path) = self.extract_path("addpresc", arg, out)? else {
      return Ok(());
    };
    let extract = match read_prescriptions(&path) {
      Ok(x) => x,
      Err(e) => return extract_error(&path, e, out),
    };
    let practice = extract.practice_ref.clone();
    let period = extract.period.clone().unwrap_or_else(|| "no period".to_owned());

    match self.store.ingest_prescriptions(extract).await {
      Ok(Outcome::Inserted { rows }) => {
        writeln!(out, "Inserted {rows} prescriptions for {practice} ({period})")?;
        writeln!(out, "Done")
      }
      Ok(Outcome::AlreadyPresent) => writeln!(out, "Data has already been inserted"),
      Err(e) => store_error(e, out),
    }
  }

  async fn coords(&self, postcode: &str, out: &mut impl Write) -> std::io::Result<()> {
    match self.store.lookup_postcode(postcode).await {
      Ok(Some(c)) => writeln!(out, "{postcode}: {}, {}", c.latitude, c.longitude),
      Ok(None) => writeln!(out, "{postcode}: unknown postcode"),
      Err(e) => store_error(e, out),
    }
  }

  async fn practice(
    &self,
    practice_ref: &str,
    period: Option<&Period>,
    out: &mut impl Write,
  ) -> std::io::Result<()> {
    let period = match period {
      Some(p) => p.clone(),
      None => match self.store.most_recent_practice(practice_ref).await {
        Ok(Some(latest)) => {
          writeln!(out, "{practice_ref}: most recent period {} ({})", latest.period, latest.title)?;
          latest.period
        }
        Ok(None) => return writeln!(out, "{practice_ref}: no such practice"),
        Err(e) => return store_error(e, out),
      },
    };

    let summary = match self.store.practice_id(practice_ref, &period).await {
      Ok(Some(s)) => s,
      Ok(None) => return writeln!(out, "{practice_ref}: not listed for {period}"),
      Err(e) => return store_error(e, out),
    };
    writeln!(out, "#{} {} [{period}]", summary.id, summary.title)?;

    let details = match self.store.practice_details(practice_ref, &period).await {
      Ok(Some(d)) => d,
      Ok(None) => return Ok(()),
      Err(e) => return store_error(e, out),
    };
    let address = [
      Some(details.address_line1.as_str()),
      details.address_line2.as_deref(),
      details.city.as_deref(),
      details.county.as_deref(),
      details.area.as_deref(),
      Some(details.postcode.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");
    let coords = details.coordinates();
    writeln!(out, "\t{address}")?;
    writeln!(out, "\t{}, {}", coords.latitude, coords.longitude)?;

    match self.store.prescriptions(practice_ref, &period).await {
      Ok(rows) => {
        let linked = rows.iter().filter(|r| r.is_linked()).count();
        writeln!(out, "\t{} prescription rows ({linked} linked)", rows.len())
      }
      Err(e) => store_error(e, out),
    }
  }
}

fn help(topic: Option<&str>, out: &mut impl Write) -> std::io::Result<()> {
  match topic {
    None => {
      for (_, syntax, about) in COMMANDS {
        writeln!(out, "{syntax:<26}-- {about}")?;
      }
      Ok(())
    }
    Some(name) => match COMMANDS.iter().find(|(n, ..)| *n == name) {
      Some((_, syntax, about)) => writeln!(out, "syntax: {syntax} -- {about}"),
      None => writeln!(out, "No help on {name}"),
    },
  }
}

fn store_error<E: std::error::Error>(e: E, out: &mut impl Write) -> std::io::Result<()> {
  tracing::error!(error = %e, "store operation failed");
  writeln!(out, "Database error: {e}")
}

fn extract_error(path: &Path, e: CoreError, out: &mut impl Write) -> std::io::Result<()> {
  tracing::error!(path = %path.display(), error = %e, "cannot read extract");
  writeln!(out, "Cannot read {}: {e}", path.display())
}

//! `presc` — interactive loader for practice address and prescription
//! extracts.
//!
//! # Usage
//!
//! ```
//! presc --config presc.ini
//! > create
//! > addpractice T201012ADDR+BNFT.csv
//! > addpresc T201012PDPI+BNFT.csv
//! > q
//! ```

mod command;
mod settings;
mod shell;

use std::{
  io::{self, Write},
  path::PathBuf,
};

use anyhow::Context as _;
use clap::Parser;
use presc_store_sqlite::SqliteStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use command::Command;
use settings::Settings;
use shell::{Control, Shell};

const BANNER: &str = "\
******************************************************************************
* Practices and Prescriptions Database - type help for assistance, q to quit *
******************************************************************************";

#[derive(Parser)]
#[command(author, version, about = "Practices and prescriptions database loader")]
struct Cli {
  /// Path to the configuration file (database, path, pc).
  #[arg(short, long, default_value = "presc.ini")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout belongs to the operator.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.database)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.database))?;
  tracing::info!(database = %settings.database.display(), "store opened");

  let shell = Shell::new(store, settings);
  let mut stdout = io::stdout();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  writeln!(stdout, "{BANNER}")?;
  loop {
    write!(stdout, "> ")?;
    stdout.flush()?;

    // End of input behaves like `quit`.
    let Some(line) = lines.next_line().await? else {
      writeln!(stdout)?;
      break;
    };

    match Command::parse(&line) {
      Ok(cmd) => {
        if shell.execute(cmd, &mut stdout).await? == Control::Quit {
          break;
        }
      }
      Err(e) => writeln!(stdout, "{e}")?,
    }
  }

  Ok(())
}

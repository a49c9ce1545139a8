//! Runtime settings, read once at startup and passed to the shell.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Settings deserialised from `presc.ini` (or any format `config` infers from
/// the file extension), overridden by `PRESC_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  /// SQLite database file.
  pub database: PathBuf,
  /// Base directory for practice and prescription extracts.
  #[serde(default = "default_base_dir")]
  pub path:     PathBuf,
  /// Postcode reference file imported by `create`.
  pub pc:       PathBuf,
}

fn default_base_dir() -> PathBuf { PathBuf::from(".") }

impl Settings {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(file.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("PRESC"))
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise Settings")?;

    Ok(Self {
      database: expand_tilde(&settings.database),
      path:     expand_tilde(&settings.path),
      pc:       expand_tilde(&settings.pc),
    })
  }

  /// Resolve an extract path given on the command line. A relative path that
  /// does not exist from the working directory is tried under [`Self::path`].
  pub fn resolve_extract(&self, arg: &str) -> PathBuf {
    let given = PathBuf::from(arg);
    if given.is_relative() && !given.exists() {
      let under_base = self.path.join(&given);
      if under_base.exists() {
        return under_base;
      }
    }
    given
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

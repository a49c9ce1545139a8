//! Operator commands and their one-line syntax.

use presc_core::period::Period;
use thiserror::Error;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Provision the schema and import postcodes.
  Create,
  /// Ingest an address extract.
  AddPractice(String),
  /// Ingest a prescription extract.
  AddPresc(String),
  /// Print the coordinates of a postcode.
  Coords(String),
  /// Print a practice's details; the most recent period if none is given.
  Practice { practice_ref: String, period: Option<Period> },
  Help(Option<String>),
  Quit,
  /// A blank line.
  Nothing,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
  #[error("Syntax: {0}")]
  Usage(&'static str),
  #[error("Unknown command {0:?}, type help for assistance")]
  Unknown(String),
}

/// `(name, syntax, description)` for every command, in help order.
pub const COMMANDS: &[(&str, &str, &str)] = &[
  ("create", "create", "Creates the database and imports postcodes"),
  ("addpractice", "addpractice ___.csv", "Adds a practices csv file into the database"),
  ("addpresc", "addpresc ___.csv", "Adds a prescriptions csv file into the database"),
  ("coords", "coords <postcode>", "Shows the coordinates of a postcode"),
  (
    "practice",
    "practice <ref> [YYYYMM]",
    "Shows a practice at a period, or its most recent period",
  ),
  ("help", "help [command]", "Lists commands or shows the syntax of one"),
  ("quit", "quit", "Terminates the application (also q)"),
];

/// Syntax line of the named command.
pub fn syntax(name: &str) -> Option<&'static str> {
  COMMANDS
    .iter()
    .find(|(n, ..)| *n == name)
    .map(|(_, syntax, _)| *syntax)
}

fn usage(name: &str) -> ParseError {
  ParseError::Usage(syntax(name).unwrap_or("help"))
}

impl Command {
  pub fn parse(line: &str) -> Result<Self, ParseError> {
    let line = line.trim();
    let (name, rest) = line
      .split_once(char::is_whitespace)
      .map(|(n, r)| (n, r.trim()))
      .unwrap_or((line, ""));

    match name {
      "" => Ok(Self::Nothing),
      "create" => Ok(Self::Create),
      "addpractice" if !rest.is_empty() => Ok(Self::AddPractice(rest.to_owned())),
      "addpresc" if !rest.is_empty() => Ok(Self::AddPresc(rest.to_owned())),
      "coords" if !rest.is_empty() => Ok(Self::Coords(rest.to_owned())),
      "practice" => {
        let mut args = rest.split_whitespace();
        let practice_ref = args.next().ok_or_else(|| usage(name))?;
        let period = args
          .next()
          .map(Period::parse)
          .transpose()
          .map_err(|_| usage(name))?;
        if args.next().is_some() {
          return Err(usage(name));
        }
        Ok(Self::Practice { practice_ref: practice_ref.to_owned(), period })
      }
      "help" => Ok(Self::Help((!rest.is_empty()).then(|| rest.to_owned()))),
      "quit" | "q" => Ok(Self::Quit),
      "addpractice" | "addpresc" | "coords" => Err(usage(name)),
      other => Err(ParseError::Unknown(other.to_owned())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_core_commands() {
    assert_eq!(Command::parse("create"), Ok(Command::Create));
    assert_eq!(
      Command::parse("  addpractice T201012ADDR+BNFT.csv "),
      Ok(Command::AddPractice("T201012ADDR+BNFT.csv".into()))
    );
    assert_eq!(
      Command::parse("addpresc T201012PDPI+BNFT.csv"),
      Ok(Command::AddPresc("T201012PDPI+BNFT.csv".into()))
    );
    assert_eq!(Command::parse("quit"), Ok(Command::Quit));
    assert_eq!(Command::parse("q"), Ok(Command::Quit));
    assert_eq!(Command::parse("   "), Ok(Command::Nothing));
  }

  #[test]
  fn file_commands_need_an_argument() {
    assert_eq!(
      Command::parse("addpractice"),
      Err(ParseError::Usage("addpractice ___.csv"))
    );
    assert_eq!(Command::parse("addpresc "), Err(ParseError::Usage("addpresc ___.csv")));
  }

  #[test]
  fn coords_keeps_inner_space() {
    assert_eq!(
      Command::parse("coords ts18 1hu"),
      Ok(Command::Coords("ts18 1hu".into()))
    );
  }

  #[test]
  fn practice_period_is_validated() {
    assert_eq!(
      Command::parse("practice A81001"),
      Ok(Command::Practice { practice_ref: "A81001".into(), period: None })
    );
    assert_eq!(
      Command::parse("practice A81001 201012"),
      Ok(Command::Practice {
        practice_ref: "A81001".into(),
        period:       Some(Period::parse("201012").unwrap()),
      })
    );
    assert!(matches!(
      Command::parse("practice A81001 2010-12"),
      Err(ParseError::Usage(_))
    ));
    assert!(matches!(Command::parse("practice"), Err(ParseError::Usage(_))));
  }

  #[test]
  fn unknown_command() {
    assert_eq!(
      Command::parse("drop everything"),
      Err(ParseError::Unknown("drop".into()))
    );
  }

  #[test]
  fn every_command_has_syntax() {
    for name in ["create", "addpractice", "addpresc", "coords", "practice", "help", "quit"] {
      assert!(syntax(name).is_some(), "{name}");
    }
    assert_eq!(syntax("q"), None);
  }
}

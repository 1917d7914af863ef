//! Run configuration, gathered from the command line.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::bytecode::{assemble, AssemblyError, LoadError, Program};
use crate::dispatch::Strategy;
use crate::programs::Sample;
use crate::vm::UNLIMITED;

pub const USAGE: &str =
  "usage: stackvm [steplimit] [switched|threaded|translated|all] [primes|factorial|smoke|FILE]";

/// Exit status for anything wrong before a run starts.
pub const EXIT_USAGE: i32 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Selection {
  Single(Strategy),
  /// Every strategy in turn, checking that they agree.
  All,
}

impl Selection {
  pub fn strategies(&self) -> Vec<Strategy> {
    match self {
      Selection::Single(strategy) => vec![*strategy],
      Selection::All => Strategy::iter().collect(),
    }
  }
}

impl FromStr for Selection {
  type Err = ConfigError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    if text.eq_ignore_ascii_case("all") {
      return Ok(Selection::All);
    }
    Strategy::from_str(text)
      .map(Selection::Single)
      .map_err(|_| ConfigError::Usage(format!("unknown strategy \"{}\"", text)))
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgramSource {
  Sample(Sample),
  /// An assembly file.
  File(PathBuf),
}

impl ProgramSource {
  /// Anything that is not the name of a sample is taken to be a path.
  pub fn parse(text: &str) -> ProgramSource {
    match Sample::from_str(text) {
      Ok(sample) => ProgramSource::Sample(sample),
      Err(_)     => ProgramSource::File(PathBuf::from(text))
    }
  }

  pub fn load(&self) -> Result<Program, ConfigError> {
    match self {
      ProgramSource::Sample(sample) => Ok(sample.program()?),
      ProgramSource::File(path) => {
        let text = std::fs::read_to_string(path)
            .map_err(|error| ConfigError::Io{ path: path.clone(), error })?;
        assemble(&text).map_err(|error| ConfigError::Assembly{ path: path.clone(), error })
      }
    }
  }
}

impl Display for ProgramSource {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ProgramSource::Sample(sample) => write!(f, "{}", sample),
      ProgramSource::File(path)     => write!(f, "{}", path.display())
    }
  }
}

#[derive(Debug)]
pub enum ConfigError {
  Usage(String),
  Io{
    path: PathBuf,
    error: io::Error
  },
  Assembly{
    path: PathBuf,
    error: AssemblyError
  },
  Load(LoadError),
}

impl Display for ConfigError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ConfigError::Usage(message)        => write!(f, "{}\n{}", message, USAGE),
      ConfigError::Io{ path, error }     => write!(f, "{}: {}", path.display(), error),
      ConfigError::Assembly{ path, error } => write!(f, "{}: {}", path.display(), error),
      ConfigError::Load(error)           => write!(f, "{}", error),
    }
  }
}

impl Error for ConfigError {}

impl From<LoadError> for ConfigError {
  fn from(error: LoadError) -> Self {
    ConfigError::Load(error)
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
  pub step_limit : i64,
  pub selection  : Selection,
  pub program    : ProgramSource,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      step_limit : UNLIMITED,
      selection  : Selection::Single(Strategy::default()),
      program    : ProgramSource::Sample(Sample::default()),
    }
  }
}

impl Config {
  /// Reads `[steplimit] [strategy] [program]`, not including the program name.
  pub fn from_args<I>(args: I) -> Result<Config, ConfigError>
    where I: IntoIterator<Item = String>
  {
    let mut config = Config::default();
    let mut args = args.into_iter();

    if let Some(text) = args.next() {
      // Leading blanks are skipped, trailing ones are not.
      config.step_limit = text.trim_start().parse::<i64>().map_err(|_| {
        ConfigError::Usage(format!("step limit \"{}\" is not an integer", text))
      })?;
    }
    if let Some(text) = args.next() {
      config.selection = Selection::from_str(&text)?;
    }
    if let Some(text) = args.next() {
      config.program = ProgramSource::parse(&text);
    }
    if let Some(text) = args.next() {
      return Err(ConfigError::Usage(format!("unexpected argument \"{}\"", text)));
    }

    Ok(config)
  }
}

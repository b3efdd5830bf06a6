//! Build request types.
//!
//! A `BuildRequest` is the parsed, immutable form of the command line. It is
//! the only input to the matrix deriver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::preset::Preset;

/// Integration target being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  Postgres,
  Oracle,
  SqlServer,
  /// The generic Indigo utilities target.
  Utils,
}

impl Backend {
  pub const ALL: [Backend; 4] = [Backend::Postgres, Backend::Oracle, Backend::SqlServer, Backend::Utils];

  /// Backends selectable through `--dbms`.
  pub const DBMS: [Backend; 3] = [Backend::Postgres, Backend::Oracle, Backend::SqlServer];

  pub fn as_str(&self) -> &'static str {
    match self {
      Backend::Postgres => "postgres",
      Backend::Oracle => "oracle",
      Backend::SqlServer => "sqlserver",
      Backend::Utils => "utils",
    }
  }

  /// Filesystem-friendly short code used in workspace names.
  pub fn short_name(&self) -> &'static str {
    match self {
      Backend::Postgres => "pg",
      Backend::Oracle => "ora",
      Backend::SqlServer => "mssql",
      Backend::Utils => "indigo_utils",
    }
  }

  /// Name of the CMake project directory under `build_scripts/`, also used as
  /// the release archive prefix.
  pub fn project_name(&self) -> &'static str {
    match self {
      Backend::Postgres => "bingo-postgres",
      Backend::Oracle => "bingo-oracle",
      Backend::SqlServer => "bingo-sqlserver",
      Backend::Utils => "indigo-utils",
    }
  }

  pub fn is_bingo(&self) -> bool {
    !matches!(self, Backend::Utils)
  }

  /// Whether the build tool produces a ready zip archive for this backend.
  /// SQL Server ships loose scripts and a managed assembly instead.
  pub fn has_native_archive(&self) -> bool {
    !matches!(self, Backend::SqlServer)
  }
}

impl fmt::Display for Backend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Backend {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "postgres" => Ok(Backend::Postgres),
      "oracle" => Ok(Backend::Oracle),
      "sqlserver" => Ok(Backend::SqlServer),
      "utils" => Ok(Backend::Utils),
      _ => Err(format!("unknown backend '{}' (expected postgres, oracle, sqlserver or utils)", s)),
    }
  }
}

/// CMake build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Configuration {
  #[default]
  Release,
  Debug,
  RelWithDebInfo,
  MinSizeRel,
}

impl Configuration {
  pub const ALL: [Configuration; 4] = [
    Configuration::Release,
    Configuration::Debug,
    Configuration::RelWithDebInfo,
    Configuration::MinSizeRel,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Configuration::Release => "Release",
      Configuration::Debug => "Debug",
      Configuration::RelWithDebInfo => "RelWithDebInfo",
      Configuration::MinSizeRel => "MinSizeRel",
    }
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Configuration {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Configuration::ALL
      .into_iter()
      .find(|c| c.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| format!("unknown configuration '{}'", s))
  }
}

/// Flags that steer control flow but never affect workspace naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFlags {
  /// Configure only; skip build, package and install.
  pub no_build: bool,
  /// Remove the workspace before configuring.
  pub clean: bool,
  /// Pass a worker count to the native build.
  pub multithreaded: bool,
}

impl Default for BuildFlags {
  fn default() -> Self {
    Self {
      no_build: false,
      clean: false,
      multithreaded: true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
  pub backend: Backend,
  pub generator: Option<String>,
  pub configuration: Configuration,
  pub preset: Option<Preset>,
  pub extra_params: Vec<String>,
  pub flags: BuildFlags,
}

impl BuildRequest {
  pub fn new(backend: Backend) -> Self {
    Self {
      backend,
      generator: None,
      configuration: Configuration::default(),
      preset: None,
      extra_params: Vec::new(),
      flags: BuildFlags::default(),
    }
  }

  /// Split a raw `--params` string into individual flags.
  pub fn parse_params(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn backend_parses_case_insensitively() {
    assert_eq!("Postgres".parse::<Backend>().unwrap(), Backend::Postgres);
    assert_eq!("sqlserver".parse::<Backend>().unwrap(), Backend::SqlServer);
    assert!("mysql".parse::<Backend>().is_err());
  }

  #[test]
  fn only_sqlserver_lacks_native_archive() {
    let manual: Vec<_> = Backend::ALL.into_iter().filter(|b| !b.has_native_archive()).collect();
    assert_eq!(manual, vec![Backend::SqlServer]);
  }

  #[test]
  fn configuration_round_trips_through_str() {
    for config in Configuration::ALL {
      assert_eq!(config.as_str().parse::<Configuration>().unwrap(), config);
    }
    assert_eq!("release".parse::<Configuration>().unwrap(), Configuration::Release);
  }

  #[test]
  fn params_split_on_whitespace() {
    assert_eq!(
      BuildRequest::parse_params("  -DFOO=1   -DBAR=2 "),
      vec!["-DFOO=1".to_string(), "-DBAR=2".to_string()]
    );
    assert!(BuildRequest::parse_params("").is_empty());
  }

  #[test]
  fn default_flags_build_in_parallel() {
    let request = BuildRequest::new(Backend::Oracle);
    assert!(request.flags.multithreaded);
    assert!(!request.flags.no_build);
    assert!(!request.flags.clean);
    assert_eq!(request.configuration, Configuration::Release);
  }
}

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use indigo_release_lib::preset::Preset;
use indigo_release_lib::request::{Backend, BuildFlags, BuildRequest, Configuration};

use crate::output::{OutputFormat, print_error};

/// indigo-release - Release builds for the Indigo toolkit and its Bingo cartridges
#[derive(Parser)]
#[command(name = "indigo-release")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project checkout to build (defaults to $INDIGO_ROOT, then the current directory)
  #[arg(long, global = true)]
  root: Option<PathBuf>,

  /// Report format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build and package a Bingo database cartridge
  Bingo {
    /// Database backend to build for
    #[arg(long, value_parser = parse_dbms)]
    dbms: Backend,

    #[command(flatten)]
    build: BuildArgs,
  },

  /// Build, test and package the Indigo utilities
  Utils {
    #[command(flatten)]
    build: BuildArgs,
  },
}

#[derive(Args)]
struct BuildArgs {
  /// CMake generator, e.g. "Unix Makefiles" or "Visual Studio 16 2019"
  #[arg(long)]
  generator: Option<String>,

  /// Extra CMake parameters, e.g. "-DFOO=ON -DBAR=1"
  #[arg(long, allow_hyphen_values = true)]
  params: Option<String>,

  /// Build configuration
  #[arg(long, default_value_t = Configuration::Release)]
  config: Configuration,

  /// Named platform preset
  #[arg(long)]
  preset: Option<Preset>,

  /// Configure only, skip build, package and install
  #[arg(long)]
  nobuild: bool,

  /// Remove the previous workspace before configuring
  #[arg(long)]
  clean: bool,

  /// Build with a single worker
  #[arg(long)]
  no_multithreaded_build: bool,
}

impl BuildArgs {
  fn into_request(self, backend: Backend) -> BuildRequest {
    BuildRequest {
      backend,
      generator: self.generator,
      configuration: self.config,
      preset: self.preset,
      extra_params: self.params.as_deref().map(BuildRequest::parse_params).unwrap_or_default(),
      flags: BuildFlags {
        no_build: self.nobuild,
        clean: self.clean,
        multithreaded: !self.no_multithreaded_build,
      },
    }
  }
}

fn parse_dbms(value: &str) -> Result<Backend, String> {
  let backend: Backend = value.parse()?;
  if Backend::DBMS.contains(&backend) {
    Ok(backend)
  } else {
    Err(format!("'{}' is not a database backend (expected postgres, oracle or sqlserver)", value))
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let request = match cli.command {
    Commands::Bingo { dbms, build } => build.into_request(dbms),
    Commands::Utils { build } => build.into_request(Backend::Utils),
  };

  match cmd::cmd_release(request, cli.root.as_deref(), cli.output) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

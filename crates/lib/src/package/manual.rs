//! Hand-assembled SQL Server package.
//!
//! The SQL Server build has no CMake package target. The release is built
//! from the loose scripts under `bingo/sqlserver/sql` and the managed assembly
//! produced by msbuild:
//!
//! ```text
//! dist/bingo-sqlserver-<version>.zip
//! └── bingo-sqlserver-<version>/
//!     ├── *.sql, *.bat
//!     └── assembly/bingo-sqlserver.dll
//! ```

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::consts::{ARCHIVE_EXTENSION, SQLSERVER_ASSEMBLY};
use crate::layout::ProjectLayout;
use crate::package::archive::compress_dir;
use crate::package::{PackageError, PackageReport};
use crate::request::{Backend, Configuration};

const SCRIPT_SOURCE_EXTENSIONS: &[&str] = &["sql", "bat"];

/// Release name for a versioned SQL Server package.
pub fn package_name(version: &str) -> String {
  format!("{}-{}", Backend::SqlServer.project_name(), version)
}

/// Assemble `dist/bingo-sqlserver-<version>.zip`.
///
/// A missing assembly is not fatal: an empty placeholder is written in its
/// place and a warning is recorded, so the scripts still ship.
pub fn assemble_sqlserver(
  layout: &ProjectLayout,
  configuration: Configuration,
  version: &str,
) -> Result<PackageReport, PackageError> {
  let dist_dir = layout.dist_dir();
  let name = package_name(version);
  let staging = dist_dir.join(&name);
  let package_dir = staging.join(&name);
  let assembly_dir = package_dir.join("assembly");
  let mut warnings = Vec::new();

  if staging.exists() {
    debug!(path = %staging.display(), "removing previous package directory");
    fs::remove_dir_all(&staging)?;
  }
  fs::create_dir_all(&assembly_dir)?;

  let copied = copy_scripts(&layout.sqlserver_scripts_dir(), &package_dir)?;
  debug!(count = copied, "copied sql scripts");

  let assembly = layout.sqlserver_assembly(configuration);
  let assembly_dest = assembly_dir.join(SQLSERVER_ASSEMBLY);
  if assembly.is_file() {
    fs::copy(&assembly, &assembly_dest)?;
  } else {
    let message = format!(
      "{} does not exist, using an empty stub at {} instead",
      assembly.display(),
      assembly_dest.display()
    );
    warn!("{}", message);
    fs::write(&assembly_dest, b"")?;
    warnings.push(message);
  }

  let archive = dist_dir.join(format!("{}.{}", name, ARCHIVE_EXTENSION));
  if archive.exists() {
    fs::remove_file(&archive)?;
  }
  compress_dir(&staging, &staging, &archive)?;
  fs::remove_dir_all(&staging)?;

  info!(archive = %archive.display(), "assembled sqlserver package");
  Ok(PackageReport {
    archives: vec![archive],
    warnings,
  })
}

/// Copy `.sql` and `.bat` files (non-recursive) from `source` into `dest`.
fn copy_scripts(source: &Path, dest: &Path) -> Result<usize, PackageError> {
  if !source.is_dir() {
    warn!(path = %source.display(), "sql script directory not found");
    return Ok(0);
  }

  let mut count = 0;
  for entry in fs::read_dir(source)? {
    let path = entry?.path();
    let is_source_script = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| SCRIPT_SOURCE_EXTENSIONS.contains(&ext));
    if !path.is_file() || !is_source_script {
      continue;
    }
    if let Some(file_name) = path.file_name() {
      fs::copy(&path, dest.join(file_name))?;
      count += 1;
    }
  }
  Ok(count)
}

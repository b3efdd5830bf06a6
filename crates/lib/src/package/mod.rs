//! Release packaging.
//!
//! Turns the artifacts left in a workspace into the archives under `dist/`.
//! Backends whose build produces a zip go through the archive flow
//! (extract, fix permissions, recompress); SQL Server is assembled by hand.

pub mod archive;
pub mod manual;

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::layout::ProjectLayout;
use crate::matrix::BuildPlan;

/// Errors that can occur while packaging.
#[derive(Debug, Error)]
pub enum PackageError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("failed to walk directory: {0}")]
  Walk(#[from] walkdir::Error),

  /// An archive entry would escape the extraction directory.
  #[error("invalid archive entry {entry} in {archive}")]
  InvalidEntry { archive: PathBuf, entry: String },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PackageReport {
  /// Release archives written to the distribution directory.
  pub archives: Vec<PathBuf>,
  /// Non-fatal conditions, such as a missing assembly replaced by a placeholder.
  pub warnings: Vec<String>,
}

/// Package the artifacts of a completed build.
///
/// `version` is only used by the manual-assembly flow; archive-flow names come
/// from the build tool.
pub fn package(plan: &BuildPlan, layout: &ProjectLayout, version: &str) -> Result<PackageReport, PackageError> {
  let dist_dir = layout.dist_dir();
  fs::create_dir_all(&dist_dir)?;

  let report = if plan.request.backend.has_native_archive() {
    PackageReport {
      archives: archive::repackage_workspace(&plan.workspace.path, &dist_dir)?,
      warnings: Vec::new(),
    }
  } else {
    manual::assemble_sqlserver(layout, plan.request.configuration, version)?
  };

  info!(
    backend = %plan.request.backend,
    archives = report.archives.len(),
    warnings = report.warnings.len(),
    "packaging complete"
  );
  Ok(report)
}

//! Release orchestration.
//!
//! Ties the pieces together for one build request:
//!
//! 1. Derive the build plan (fails before touching the filesystem)
//! 2. Configure, build, package and install in the workspace
//! 3. Stop if only configuration was requested
//! 4. Resolve the release version
//! 5. Repackage (or assemble) the archives under `dist/`

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::invoke::{CommandRunner, InvokeError, InvokeStage, Invoker};
use crate::layout::ProjectLayout;
use crate::matrix::{HostEnv, MatrixError, Workspace, derive_plan};
use crate::package::{PackageError, package};
use crate::request::{Backend, BuildRequest};
use crate::version::backend_version;

/// Errors that can occur during a release run.
#[derive(Debug, Error)]
pub enum ReleaseError {
  /// The request cannot be built on this host.
  #[error("{0}")]
  Matrix(#[from] MatrixError),

  /// An external build step failed.
  #[error("build failed: {0}")]
  Invoke(#[from] InvokeError),

  /// Repackaging the build output failed.
  #[error("packaging failed: {0}")]
  Package(#[from] PackageError),
}

/// Summary of one release run.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
  pub backend: Backend,
  pub workspace: Workspace,
  pub stage: InvokeStage,
  /// `None` when the run stopped after configure.
  pub version: Option<String>,
  /// Stale archives removed from the workspace.
  pub purged: Vec<PathBuf>,
  /// Release archives written to the distribution directory.
  pub archives: Vec<PathBuf>,
  pub warnings: Vec<String>,
}

/// Run a full release for `request`.
pub async fn release<R: CommandRunner>(
  request: &BuildRequest,
  layout: &ProjectLayout,
  env: &HostEnv,
  runner: &R,
) -> Result<ReleaseReport, ReleaseError> {
  let plan = derive_plan(request, layout, env)?;
  info!(
    backend = %request.backend,
    workspace = %plan.workspace.name,
    generator = plan.generator.as_deref().unwrap_or("<default>"),
    "starting release"
  );
  debug!(params = ?plan.params, "derived build plan");

  let outcome = Invoker::new(runner, layout).run(&plan).await?;
  let mut report = ReleaseReport {
    backend: request.backend,
    workspace: plan.workspace.clone(),
    stage: outcome.stage,
    version: None,
    purged: outcome.purged,
    archives: Vec::new(),
    warnings: outcome.warnings,
  };

  if report.stage != InvokeStage::Built {
    return Ok(report);
  }

  let version = backend_version(layout, request.backend);
  let packaged = package(&plan, layout, &version)?;
  report.archives = packaged.archives;
  report.warnings.extend(packaged.warnings);
  report.version = Some(version);

  info!(
    archives = report.archives.len(),
    warnings = report.warnings.len(),
    "release complete"
  );
  Ok(report)
}

//! Implementation of the `indigo-release bingo` and `indigo-release utils` commands.
//!
//! Both subcommands run the same pipeline; they only differ in how the backend
//! is selected.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use indigo_release_lib::invoke::{InvokeStage, ProcessRunner};
use indigo_release_lib::layout::ProjectLayout;
use indigo_release_lib::matrix::HostEnv;
use indigo_release_lib::release::release;
use indigo_release_lib::request::BuildRequest;

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_success, print_warning};

/// Execute a release run.
///
/// Locates the checkout, snapshots the environment, then derives, builds and
/// packages the request. Prints a summary of the workspace, the produced
/// archives and any warnings.
pub fn cmd_release(request: BuildRequest, root: Option<&Path>, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let layout = ProjectLayout::discover(root).context("Failed to locate project root")?;
  info!(root = %layout.root().display(), "using project root");
  let env = HostEnv::capture();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(release(&request, &layout, &env, &ProcessRunner))
    .with_context(|| format!("Release of {} failed", request.backend))?;

  if output.is_json() {
    return print_json(&report);
  }

  println!();
  match report.stage {
    InvokeStage::Configured => print_info("Configured only - build skipped"),
    InvokeStage::Built => print_success("Release complete!"),
  }
  print_stat("Workspace", &report.workspace.path.display().to_string());
  if let Some(version) = &report.version {
    print_stat("Version", version);
  }
  for archive in &report.archives {
    print_stat("Archive", &archive.display().to_string());
  }
  if !report.purged.is_empty() {
    print_stat("Stale archives removed", &report.purged.len().to_string());
  }
  print_stat("Duration", &format_duration(start.elapsed()));

  for warning in &report.warnings {
    print_warning(warning);
  }

  Ok(())
}

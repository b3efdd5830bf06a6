//! Types for external build invocation.
//!
//! Error and result types shared by the runner, the directory guard and the
//! invoker state machine.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while driving the external build tool.
#[derive(Debug, Error)]
pub enum InvokeError {
  /// The process ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// The process could not be started (tool missing from PATH, etc.).
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The working directory could not be switched or restored.
  #[error("failed to change directory to {path}: {source}")]
  ChangeDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// I/O error while preparing the workspace.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// How far the invoker got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeStage {
  /// `no_build` was set; the run stopped after configure.
  Configured,
  /// Build (and package/install where the generator supports it) completed.
  Built,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvokeOutcome {
  pub stage: InvokeStage,
  /// Stale archives removed from the workspace before building.
  pub purged: Vec<PathBuf>,
  /// Non-fatal conditions encountered along the way.
  pub warnings: Vec<String>,
}

impl InvokeOutcome {
  pub fn is_built(&self) -> bool {
    self.stage == InvokeStage::Built
  }
}

//! External process execution.
//!
//! [`Invocation`] describes one blocking call to an external tool.
//! [`CommandRunner`] is the seam between the invoker state machine and the
//! operating system; [`ProcessRunner`] is the real implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::invoke::types::InvokeError;

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  /// Variables added on top of the inherited environment.
  pub env: BTreeMap<String, String>,
  pub cwd: PathBuf,
}

impl Invocation {
  pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: BTreeMap::new(),
      cwd: cwd.to_path_buf(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
    self.env.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    self
  }

  /// Program and arguments, space separated.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Shell-like rendering including environment overrides, for logs.
impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (key, value) in &self.env {
      write!(f, "{}={} ", key, value)?;
    }
    f.write_str(&self.command_line())
  }
}

/// Runs invocations to completion. A nonzero exit must be reported as
/// [`InvokeError::CmdFailed`].
pub trait CommandRunner {
  fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<(), InvokeError>> + Send;
}

/// Spawns real processes with inherited stdio so build output streams to the
/// terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
  async fn run(&self, invocation: &Invocation) -> Result<(), InvokeError> {
    info!(cmd = %invocation, cwd = %invocation.cwd.display(), "executing command");

    let mut command = Command::new(&invocation.program);
    command
      .args(&invocation.args)
      .envs(&invocation.env)
      .current_dir(&invocation.cwd);

    let status = command.status().await.map_err(|source| InvokeError::Spawn {
      program: invocation.program.clone(),
      source,
    })?;

    if !status.success() {
      return Err(InvokeError::CmdFailed {
        cmd: invocation.command_line(),
        code: status.code(),
      });
    }

    debug!(cmd = %invocation.program, "command succeeded");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{shell_cmd, touch_file};
  use tempfile::TempDir;

  fn invocation((program, args): (&str, Vec<String>), cwd: &Path) -> Invocation {
    Invocation::new(program, cwd).args(args)
  }

  #[test]
  fn display_includes_env_overrides() {
    let inv = Invocation::new("cmake", Path::new("/tmp"))
      .args(["-G", "Unix Makefiles"])
      .env("CC", "gcc")
      .env("CXX", "g++");

    assert_eq!(inv.to_string(), "CC=gcc CXX=g++ cmake -G Unix Makefiles");
    assert_eq!(inv.command_line(), "cmake -G Unix Makefiles");
  }

  #[tokio::test]
  async fn runs_in_requested_directory() {
    let temp = TempDir::new().unwrap();

    ProcessRunner
      .run(&invocation(touch_file("cwd_marker"), temp.path()))
      .await
      .unwrap();

    assert!(temp.path().join("cwd_marker").exists());
  }

  #[tokio::test]
  async fn nonzero_exit_is_cmd_failed() {
    let temp = TempDir::new().unwrap();

    let result = ProcessRunner.run(&invocation(shell_cmd("exit 3"), temp.path())).await;

    assert!(matches!(result, Err(InvokeError::CmdFailed { code: Some(3), .. })));
  }

  #[tokio::test]
  async fn missing_program_is_spawn_error() {
    let temp = TempDir::new().unwrap();
    let inv = Invocation::new("definitely-not-a-real-build-tool", temp.path());

    let result = ProcessRunner.run(&inv).await;

    assert!(matches!(result, Err(InvokeError::Spawn { .. })));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn env_overrides_reach_the_process() {
    let temp = TempDir::new().unwrap();
    let inv = invocation(shell_cmd("test \"$CC\" = gcc"), temp.path()).env("CC", "gcc");

    ProcessRunner.run(&inv).await.unwrap();
  }
}

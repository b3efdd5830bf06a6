//! Test utilities for indigo-release-lib.
//!
//! Cross-platform command helpers, a recording [`CommandRunner`] and zip
//! fixture builders.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::invoke::{CommandRunner, InvokeError, Invocation};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to create a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  ("/usr/bin/touch", vec![filename.to_string()])
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  (
    "powershell.exe",
    vec![
      "-NoProfile".to_string(),
      "-Command".to_string(),
      format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
    ],
  )
}

type Hook = Box<dyn Fn(&Invocation) + Send + Sync>;

/// Records every invocation instead of spawning it.
///
/// The process working directory at call time is captured alongside each
/// invocation. An optional hook can simulate side effects of the real tool
/// (e.g. `make package` dropping an archive into the workspace).
#[derive(Default)]
pub struct RecordingRunner {
  calls: Mutex<Vec<(Invocation, PathBuf)>>,
  fail_at: Option<usize>,
  hook: Option<Hook>,
}

impl RecordingRunner {
  /// Fail the `index`-th invocation (0-based) with exit code 1.
  pub fn failing_at(index: usize) -> Self {
    Self {
      fail_at: Some(index),
      ..Self::default()
    }
  }

  pub fn with_hook(hook: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
    Self {
      hook: Some(Box::new(hook)),
      ..Self::default()
    }
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.calls.lock().unwrap().iter().map(|(inv, _)| inv.clone()).collect()
  }

  pub fn command_lines(&self) -> Vec<String> {
    self.invocations().iter().map(Invocation::command_line).collect()
  }

  /// Process working directory observed at each call.
  pub fn cwds(&self) -> Vec<PathBuf> {
    self.calls.lock().unwrap().iter().map(|(_, cwd)| cwd.clone()).collect()
  }
}

impl CommandRunner for RecordingRunner {
  async fn run(&self, invocation: &Invocation) -> Result<(), InvokeError> {
    let cwd = dunce::canonicalize(std::env::current_dir()?)?;
    let index = {
      let mut calls = self.calls.lock().unwrap();
      calls.push((invocation.clone(), cwd));
      calls.len() - 1
    };

    if self.fail_at == Some(index) {
      return Err(InvokeError::CmdFailed {
        cmd: invocation.command_line(),
        code: Some(1),
      });
    }

    if let Some(hook) = &self.hook {
      hook(invocation);
    }
    Ok(())
  }
}

/// Write a zip at `path` with the given `(name, content, unix mode)` entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8], u32)]) {
  let file = File::create(path).unwrap();
  let mut zip = ZipWriter::new(file);
  for (name, content, mode) in entries {
    let options = SimpleFileOptions::default().unix_permissions(*mode);
    zip.start_file(*name, options).unwrap();
    zip.write_all(content).unwrap();
  }
  zip.finish().unwrap();
}

/// A file entry read back from a zip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
  pub name: String,
  pub content: Vec<u8>,
  pub mode: Option<u32>,
}

/// Read all file entries of a zip, in archive order.
pub fn read_zip(path: &Path) -> Vec<ZipEntry> {
  let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
  let mut entries = Vec::new();
  for i in 0..archive.len() {
    let mut file = archive.by_index(i).unwrap();
    if file.is_dir() {
      continue;
    }
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    entries.push(ZipEntry {
      name: file.name().to_string(),
      content,
      mode: file.unix_mode(),
    });
  }
  entries
}

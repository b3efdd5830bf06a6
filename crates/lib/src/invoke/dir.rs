//! Scoped working-directory switching.
//!
//! The process working directory is global state. Every switch goes through
//! [`DirGuard`], which restores the previous directory when dropped, so early
//! returns and `?` propagation leave the caller where it started.

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::invoke::types::InvokeError;

#[must_use = "the previous directory is restored when the guard is dropped"]
pub struct DirGuard {
  previous: PathBuf,
  current: PathBuf,
}

impl DirGuard {
  pub fn enter(path: &Path) -> Result<Self, InvokeError> {
    let previous = std::env::current_dir()?;
    std::env::set_current_dir(path).map_err(|source| InvokeError::ChangeDir {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(from = %previous.display(), to = %path.display(), "entered directory");

    Ok(Self {
      previous,
      current: path.to_path_buf(),
    })
  }

  pub fn path(&self) -> &Path {
    &self.current
  }

  pub fn previous(&self) -> &Path {
    &self.previous
  }
}

impl Drop for DirGuard {
  fn drop(&mut self) {
    match std::env::set_current_dir(&self.previous) {
      Ok(()) => debug!(to = %self.previous.display(), "restored directory"),
      Err(e) => error!(path = %self.previous.display(), error = %e, "failed to restore working directory"),
    }
  }
}

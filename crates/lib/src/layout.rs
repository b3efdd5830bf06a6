//! Fixed filesystem locations inside an Indigo checkout.
//!
//! Every path the pipeline touches is derived from a single project root so
//! that tests can point the whole orchestrator at a temporary directory.

use std::path::{Path, PathBuf};

use crate::consts::{BUILD_DIR, DIST_DIR, ROOT_ENV, SQLSERVER_ASSEMBLY};
use crate::request::{Backend, Configuration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
  root: PathBuf,
}

impl ProjectLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Resolve the project root from an explicit path, `INDIGO_ROOT`, or the
  /// current directory, in that order.
  pub fn discover(explicit: Option<&Path>) -> std::io::Result<Self> {
    let root = match explicit {
      Some(path) => path.to_path_buf(),
      None => match std::env::var_os(ROOT_ENV) {
        Some(value) => PathBuf::from(value),
        None => std::env::current_dir()?,
      },
    };
    let root = dunce::canonicalize(&root)?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn build_root(&self) -> PathBuf {
    self.root.join(BUILD_DIR)
  }

  pub fn dist_dir(&self) -> PathBuf {
    self.root.join(DIST_DIR)
  }

  pub fn workspace_dir(&self, name: &str) -> PathBuf {
    self.build_root().join(name)
  }

  /// CMake project directory for a backend.
  pub fn project_dir(&self, backend: Backend) -> PathBuf {
    self.root.join("build_scripts").join(backend.project_name())
  }

  /// Source file declaring the version string for a backend.
  pub fn version_file(&self, backend: Backend) -> PathBuf {
    if backend.is_bingo() {
      self
        .root
        .join("bingo")
        .join("bingo-core")
        .join("src")
        .join("core")
        .join("bingo_version.h")
    } else {
      self.root.join("api").join("indigo-version.cmake")
    }
  }

  /// Headers of the bundled Oracle client SDK.
  pub fn bundled_oci_include(&self) -> PathBuf {
    self.root.join("third_party").join("oci").join("include")
  }

  pub fn sqlserver_dir(&self) -> PathBuf {
    self.root.join("bingo").join("sqlserver")
  }

  /// Loose SQL and batch scripts shipped next to the assembly.
  pub fn sqlserver_scripts_dir(&self) -> PathBuf {
    self.sqlserver_dir().join("sql")
  }

  /// Managed assembly produced by msbuild.
  pub fn sqlserver_assembly(&self, configuration: Configuration) -> PathBuf {
    self
      .sqlserver_dir()
      .join("bin")
      .join(configuration.as_str())
      .join(SQLSERVER_ASSEMBLY)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn paths_hang_off_root() {
    let layout = ProjectLayout::new("/src/indigo");

    assert_eq!(layout.build_root(), PathBuf::from("/src/indigo/build"));
    assert_eq!(layout.dist_dir(), PathBuf::from("/src/indigo/dist"));
    assert_eq!(
      layout.project_dir(Backend::Postgres),
      PathBuf::from("/src/indigo/build_scripts/bingo-postgres")
    );
    assert_eq!(
      layout.project_dir(Backend::Utils),
      PathBuf::from("/src/indigo/build_scripts/indigo-utils")
    );
    assert_eq!(
      layout.sqlserver_assembly(Configuration::Debug),
      PathBuf::from("/src/indigo/bingo/sqlserver/bin/Debug/bingo-sqlserver.dll")
    );
  }

  #[test]
  fn version_file_depends_on_backend() {
    let layout = ProjectLayout::new("/r");
    assert!(layout.version_file(Backend::Oracle).ends_with("bingo_version.h"));
    assert!(layout.version_file(Backend::Utils).ends_with("indigo-version.cmake"));
  }

  #[test]
  #[serial]
  fn discover_prefers_explicit_path() {
    let temp = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();

    temp_env::with_var(ROOT_ENV, Some(other.path()), || {
      let layout = ProjectLayout::discover(Some(temp.path())).unwrap();
      assert_eq!(layout.root(), dunce::canonicalize(temp.path()).unwrap());
    });
  }

  #[test]
  #[serial]
  fn discover_falls_back_to_env() {
    let temp = TempDir::new().unwrap();

    temp_env::with_var(ROOT_ENV, Some(temp.path()), || {
      let layout = ProjectLayout::discover(None).unwrap();
      assert_eq!(layout.root(), dunce::canonicalize(temp.path()).unwrap());
    });
  }
}

//! Version resolution.
//!
//! Reads a version declaration out of a source file. A missing file or a
//! reformatted declaration degrades to [`UNKNOWN_VERSION`] instead of failing
//! the release.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::consts::UNKNOWN_VERSION;
use crate::layout::ProjectLayout;
use crate::request::Backend;

/// `#define BINGO_VERSION "1.4.2-rc.1"`; the suffix after `-` is dropped.
const BINGO_VERSION_PATTERN: &str = r#"BINGO_VERSION "([^"-]*)-[^"]*""#;

/// `SET(INDIGO_VERSION "1.4.2")`
const INDIGO_VERSION_PATTERN: &str = r#"SET\(INDIGO_VERSION "([^"]*)""#;

pub fn version_pattern(backend: Backend) -> Regex {
  let pattern = if backend.is_bingo() {
    BINGO_VERSION_PATTERN
  } else {
    INDIGO_VERSION_PATTERN
  };
  Regex::new(pattern).expect("version pattern is valid")
}

/// Return the first capture group of the first line matching `pattern`.
pub fn resolve_from_str(content: &str, pattern: &Regex) -> Option<String> {
  content
    .lines()
    .find_map(|line| pattern.captures(line))
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str().to_string())
}

/// Resolve the version declared in `path`, or `"unknown"`.
pub fn resolve_version(path: &Path, pattern: &Regex) -> String {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) => {
      warn!(path = %path.display(), error = %e, "cannot read version file");
      return UNKNOWN_VERSION.to_string();
    }
  };

  match resolve_from_str(&content, pattern) {
    Some(version) if !is_path_safe(&version) => {
      warn!(path = %path.display(), version = %version, "version is not usable in a file name");
      UNKNOWN_VERSION.to_string()
    }
    Some(version) => {
      debug!(path = %path.display(), version = %version, "resolved version");
      version
    }
    None => {
      warn!(path = %path.display(), "no version declaration found");
      UNKNOWN_VERSION.to_string()
    }
  }
}

/// The version names archives and staging directories, so it must stay a
/// single path component.
fn is_path_safe(version: &str) -> bool {
  !version.is_empty() && version != "." && !version.contains(['/', '\\']) && !version.contains("..")
}

/// Resolve the release version for a backend inside a checkout.
pub fn backend_version(layout: &ProjectLayout, backend: Backend) -> String {
  resolve_version(&layout.version_file(backend), &version_pattern(backend))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn indigo_declaration() {
    let pattern = version_pattern(Backend::Utils);
    let content = "# generated\nSET(INDIGO_VERSION \"1.4.2\")\n";
    assert_eq!(resolve_from_str(content, &pattern).as_deref(), Some("1.4.2"));
  }

  #[test]
  fn bingo_declaration_drops_suffix() {
    let pattern = version_pattern(Backend::Postgres);
    let content = "#ifndef __bingo_version__\n#define BINGO_VERSION \"1.4.2-rc.1\"\n#endif\n";
    assert_eq!(resolve_from_str(content, &pattern).as_deref(), Some("1.4.2"));
  }

  #[test]
  fn first_match_wins() {
    let pattern = version_pattern(Backend::Utils);
    let content = "SET(INDIGO_VERSION \"1.0.0\")\nSET(INDIGO_VERSION \"2.0.0\")\n";
    assert_eq!(resolve_from_str(content, &pattern).as_deref(), Some("1.0.0"));
  }

  #[test]
  fn no_match_is_unknown() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("indigo-version.cmake");
    std::fs::write(&path, "SET(OTHER_VERSION \"9.9\")\n").unwrap();

    assert_eq!(resolve_version(&path, &version_pattern(Backend::Utils)), "unknown");
  }

  #[test]
  fn version_with_path_separators_is_unknown() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bingo_version.h");
    let pattern = version_pattern(Backend::Postgres);

    std::fs::write(&path, "#define BINGO_VERSION \"../../etc-x\"\n").unwrap();
    assert_eq!(resolve_version(&path, &pattern), "unknown");

    std::fs::write(&path, "#define BINGO_VERSION \"1.4\\\\2-x\"\n").unwrap();
    assert_eq!(resolve_version(&path, &pattern), "unknown");

    std::fs::write(&path, "#define BINGO_VERSION \"-x\"\n").unwrap();
    assert_eq!(resolve_version(&path, &pattern), "unknown");
  }

  #[test]
  fn missing_file_is_unknown() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.h");

    assert_eq!(resolve_version(&path, &version_pattern(Backend::Oracle)), "unknown");
  }

  #[test]
  fn backend_version_reads_layout_file() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path());
    let file = layout.version_file(Backend::Utils);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(&file, "SET(INDIGO_VERSION \"1.4.2\")\n").unwrap();

    assert_eq!(backend_version(&layout, Backend::Utils), "1.4.2");
  }
}

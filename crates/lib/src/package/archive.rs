//! Zip extraction and recompression.
//!
//! The build tool's packaging step does not reliably keep executable bits, so
//! archives are unpacked, script permissions are fixed on disk and the tree is
//! compressed again with explicit unix modes.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::consts::{ARCHIVE_EXTENSION, SCRIPT_EXTENSIONS, SHARED_SUFFIX};
use crate::invoke::list_archives;
use crate::package::PackageError;

const SCRIPT_MODE: u32 = 0o755;
#[cfg(not(unix))]
const FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;

/// Archive name with the shared-package marker and extension removed:
/// `bingo-oracle-1.4.2-linux64-shared.zip` becomes `bingo-oracle-1.4.2-linux64`.
pub fn bare_name(file_name: &str) -> &str {
  let stem = file_name
    .strip_suffix(&format!(".{}", ARCHIVE_EXTENSION))
    .unwrap_or(file_name);
  stem.strip_suffix(SHARED_SUFFIX).unwrap_or(stem)
}

pub fn is_script(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Repackage every archive in `workspace` into `dist_dir`.
///
/// Each archive is extracted to `<workspace>/<bare>/<bare>/` and compressed
/// again as `<dist_dir>/<bare>.zip` with `<bare>/` as its top-level directory.
pub fn repackage_workspace(workspace: &Path, dist_dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
  let mut produced = Vec::new();

  for archive in list_archives(workspace)? {
    let Some(file_name) = archive.file_name().and_then(|n| n.to_str()) else {
      continue;
    };
    let bare = bare_name(file_name).to_string();
    let staging = workspace.join(&bare);

    if staging.exists() {
      debug!(path = %staging.display(), "removing stale extraction");
      fs::remove_dir_all(&staging)?;
    }

    let tree = staging.join(&bare);
    extract_zip(&archive, &tree)?;
    mark_scripts_executable(&tree)?;

    let dest = dist_dir.join(format!("{}.{}", bare, ARCHIVE_EXTENSION));
    compress_dir(&tree, &staging, &dest)?;
    info!(from = %archive.display(), to = %dest.display(), "repackaged archive");
    produced.push(dest);
  }

  Ok(produced)
}

/// Extract `archive_path` into `dest`, keeping stored unix modes.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), PackageError> {
  let file = File::open(archive_path)?;
  let mut archive = ZipArchive::new(BufReader::new(file))?;
  fs::create_dir_all(dest)?;

  for i in 0..archive.len() {
    let mut entry = archive.by_index(i)?;
    let relative = entry.enclosed_name().ok_or_else(|| PackageError::InvalidEntry {
      archive: archive_path.to_path_buf(),
      entry: entry.name().to_string(),
    })?;
    let out_path = dest.join(&relative);

    if entry.is_dir() {
      fs::create_dir_all(&out_path)?;
      continue;
    }

    if let Some(parent) = out_path.parent() {
      fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    if entry.is_symlink() {
      let mut target = String::new();
      io::Read::read_to_string(&mut entry, &mut target)?;
      if !link_stays_inside(&relative, Path::new(&target)) {
        return Err(PackageError::InvalidEntry {
          archive: archive_path.to_path_buf(),
          entry: entry.name().to_string(),
        });
      }
      if out_path.symlink_metadata().is_ok() {
        fs::remove_file(&out_path)?;
      }
      std::os::unix::fs::symlink(&target, &out_path)?;
      continue;
    }

    let mut out = File::create(&out_path)?;
    io::copy(&mut entry, &mut out)?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = entry.unix_mode() {
        fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))?;
      }
    }
  }

  debug!(archive = %archive_path.display(), dest = %dest.display(), "extracted archive");
  Ok(())
}

/// Whether a link at `link` (relative to the extraction root) pointing at
/// `target` resolves inside the root.
#[cfg(unix)]
fn link_stays_inside(link: &Path, target: &Path) -> bool {
  use std::path::Component;

  if target.has_root() {
    return false;
  }
  let mut depth = link.components().count().saturating_sub(1);
  for component in target.components() {
    match component {
      Component::Normal(_) => depth += 1,
      Component::CurDir => {}
      Component::ParentDir => match depth.checked_sub(1) {
        Some(d) => depth = d,
        None => return false,
      },
      Component::RootDir | Component::Prefix(_) => return false,
    }
  }
  true
}

/// Set the executable bit on every `.sh`/`.bat` file under `root`.
pub fn mark_scripts_executable(root: &Path) -> Result<usize, PackageError> {
  let mut count = 0;
  for entry in WalkDir::new(root) {
    let entry = entry?;
    if entry.file_type().is_file() && is_script(entry.path()) {
      set_executable(entry.path())?;
      count += 1;
    }
  }
  debug!(root = %root.display(), count, "marked scripts executable");
  Ok(count)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(SCRIPT_MODE))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
  // No executable bit on disk; compress_dir writes the mode into the archive.
  Ok(())
}

/// Compress the tree at `root` into `dest`. Entry names are relative to `base`
/// and always use `/` separators.
pub fn compress_dir(root: &Path, base: &Path, dest: &Path) -> Result<(), PackageError> {
  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut zip = ZipWriter::new(BufWriter::new(File::create(dest)?));
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry?;
    let path = entry.path();
    let Ok(relative) = path.strip_prefix(base) else {
      continue;
    };
    if relative.as_os_str().is_empty() {
      continue;
    }
    let name = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    if entry.file_type().is_dir() {
      zip.add_directory(name, options.unix_permissions(DIR_MODE))?;
    } else if entry.file_type().is_file() {
      zip.start_file(name, options.unix_permissions(file_mode(path)?))?;
      let mut source = File::open(path)?;
      io::copy(&mut source, &mut zip)?;
    } else if entry.file_type().is_symlink() {
      let target = fs::read_link(path)?;
      debug!(link = %name, target = %target.display(), "storing symlink");
      zip.add_symlink_from_path(name, target, options)?;
    }
  }

  zip.finish()?.flush()?;
  Ok(())
}

fn file_mode(path: &Path) -> io::Result<u32> {
  if is_script(path) {
    return Ok(SCRIPT_MODE);
  }

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o777)
  }

  #[cfg(not(unix))]
  {
    Ok(FILE_MODE)
  }
}

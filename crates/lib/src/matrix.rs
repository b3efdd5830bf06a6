//! Build matrix derivation.
//!
//! Turns a sparse [`BuildRequest`] into a [`BuildPlan`]: the canonical
//! workspace, the resolved generator and the full CMake parameter list.
//! Derivation never touches the filesystem except to check for the bundled
//! Oracle SDK.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::ORACLE_HOME_ENV;
use crate::generator::{GeneratorFamily, shorten_generator};
use crate::layout::ProjectLayout;
use crate::preset::{Preset, PresetDefaults};
use crate::request::{Backend, BuildRequest};

const SYSTEM_OCI_FLAG: &str = "-DUSE_SYSTEM_OCI=ON";
const UNIVERSAL_BUILD_FLAG: &str = "-DUNIVERSAL_BUILD=TRUE";
const STATIC_BUILD_FLAG: &str = "-DWITH_STATIC=TRUE";

#[derive(Debug, Error)]
pub enum MatrixError {
  #[error(
    "no Oracle client SDK found: {include_dir} does not exist and {env} is not set",
    env = ORACLE_HOME_ENV
  )]
  OracleSdkMissing { include_dir: PathBuf },

  #[error("preset {preset} is not supported for {backend}: a Visual Studio preset is required")]
  UnsupportedPreset { backend: Backend, preset: Preset },
}

/// Snapshot of the process environment taken once per run.
#[derive(Debug, Clone, Default)]
pub struct HostEnv {
  pub oracle_home: Option<OsString>,
}

impl HostEnv {
  pub fn capture() -> Self {
    Self {
      oracle_home: std::env::var_os(ORACLE_HOME_ENV),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
  pub name: String,
  pub path: PathBuf,
}

/// Everything the invoker and packager need for one matrix point.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
  pub request: BuildRequest,
  pub generator: Option<String>,
  pub family: GeneratorFamily,
  pub workspace: Workspace,
  /// CMake parameters, user flags included, in invocation order.
  pub params: Vec<String>,
  /// Environment overrides for the configure step.
  pub configure_env: BTreeMap<String, String>,
  pub project_dir: PathBuf,
}

/// Derive the build plan for `request`.
pub fn derive_plan(request: &BuildRequest, layout: &ProjectLayout, env: &HostEnv) -> Result<BuildPlan, MatrixError> {
  let preset_defaults = resolve_preset(request)?;
  let generator = resolve_generator(request, preset_defaults);
  let family = GeneratorFamily::classify(generator.as_deref());

  let mut params: Vec<String> = Vec::new();
  if let Some(defaults) = preset_defaults {
    params.extend(defaults.flags.iter().map(|f| f.to_string()));
  }
  params.extend(request.extra_params.iter().cloned());

  match request.backend {
    Backend::Oracle => {
      if use_system_oci(layout, env)? {
        params.push(SYSTEM_OCI_FLAG.to_string());
      }
    }
    Backend::Utils => params.push(STATIC_BUILD_FLAG.to_string()),
    Backend::Postgres | Backend::SqlServer => {}
  }

  if request.preset.is_some_and(|p| p.is_universal()) {
    params.push(UNIVERSAL_BUILD_FLAG.to_string());
  }

  let name = workspace_name(request, &params);
  let workspace = Workspace {
    path: layout.workspace_dir(&name),
    name,
  };

  let mut configure_env = BTreeMap::new();
  if request.preset.is_some_and(|p| p.selects_gnu_toolchain()) {
    configure_env.insert("CC".to_string(), "gcc".to_string());
    configure_env.insert("CXX".to_string(), "g++".to_string());
  }

  debug!(workspace = %workspace.name, family = %family, params = ?params, "derived build plan");

  Ok(BuildPlan {
    request: request.clone(),
    generator,
    family,
    workspace,
    params,
    configure_env,
    project_dir: layout.project_dir(request.backend),
  })
}

/// Generator and flags contributed by the preset. SQL Server always builds
/// with the 64-bit Visual Studio toolchain of its preset's year.
fn resolve_preset(request: &BuildRequest) -> Result<Option<PresetDefaults>, MatrixError> {
  let Some(preset) = request.preset else {
    return Ok(None);
  };

  if request.backend != Backend::SqlServer {
    return Ok(Some(preset.defaults()));
  }

  preset
    .sqlserver_defaults()
    .map(Some)
    .ok_or(MatrixError::UnsupportedPreset {
      backend: request.backend,
      preset,
    })
}

/// Explicit `--generator` wins; otherwise the preset's default. For SQL Server
/// the preset's Visual Studio generator wins over an explicit one.
fn resolve_generator(request: &BuildRequest, preset_defaults: Option<PresetDefaults>) -> Option<String> {
  let requested = requested_generator(request);

  if request.backend == Backend::SqlServer
    && let Some(defaults) = preset_defaults
  {
    if let Some(requested) = requested.filter(|g| *g != defaults.generator) {
      warn!(
        requested = %requested,
        generator = %defaults.generator,
        "ignoring --generator for sqlserver, the preset selects the Visual Studio generator"
      );
    }
    return Some(defaults.generator.to_string());
  }

  requested
    .map(str::to_string)
    .or_else(|| preset_defaults.map(|d| d.generator.to_string()))
}

fn requested_generator(request: &BuildRequest) -> Option<&str> {
  request.generator.as_deref().filter(|g| !g.trim().is_empty())
}

/// Decide how the Oracle backend finds its client SDK.
///
/// Returns `true` when the system SDK under `ORACLE_HOME` must be used.
fn use_system_oci(layout: &ProjectLayout, env: &HostEnv) -> Result<bool, MatrixError> {
  let include_dir = layout.bundled_oci_include();
  if include_dir.is_dir() {
    info!(path = %include_dir.display(), "using bundled Oracle client SDK");
    return Ok(false);
  }

  match &env.oracle_home {
    Some(home) => {
      info!(oracle_home = %home.to_string_lossy(), "using system Oracle client SDK");
      Ok(true)
    }
    None => Err(MatrixError::OracleSdkMissing { include_dir }),
  }
}

/// Canonical workspace name: backend, requested generator, configuration,
/// preset and parameters joined with `_`, with every space, `=` and `-`
/// replaced. The generator a preset would pick is not spelled out; the preset
/// tag already identifies it.
pub fn workspace_name(request: &BuildRequest, params: &[String]) -> String {
  let mut parts: Vec<String> = vec![
    request.backend.short_name().to_string(),
    shorten_generator(requested_generator(request)),
    request.configuration.as_str().to_string(),
  ];
  if let Some(preset) = request.preset {
    parts.push(preset.as_str().to_string());
  }
  parts.extend(params.iter().map(|p| p.strip_prefix("-D").unwrap_or(p).to_string()));

  sanitize(&parts.join("_"))
}

fn sanitize(name: &str) -> String {
  name.replace([' ', '=', '-'], "_")
}

//! External build invocation.
//!
//! Drives the generator-keyed sequence of calls against CMake and the native
//! toolchain for one [`BuildPlan`]:
//!
//! 1. workspace setup (optional clean, then create)
//! 2. stale archive purge
//! 3. configure
//! 4. early exit when `no_build` is set
//! 5. build, package and install, per [`GeneratorFamily`] (build only for
//!    SQL Server)
//! 6. backend extras (SQL Server assembly, utilities self-test)
//!
//! Every step blocks on the previous one and any failure aborts the run.

pub mod dir;
pub mod runner;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::consts::ARCHIVE_EXTENSION;
use crate::generator::GeneratorFamily;
use crate::layout::ProjectLayout;
use crate::matrix::BuildPlan;
use crate::request::Backend;

pub use dir::DirGuard;
pub use runner::{CommandRunner, Invocation, ProcessRunner};
pub use types::{InvokeError, InvokeOutcome, InvokeStage};

const CMAKE: &str = "cmake";

/// Remove the workspace when `clean` is set, then make sure it exists.
pub fn prepare_workspace(path: &Path, clean: bool) -> Result<(), InvokeError> {
  if clean && path.exists() {
    info!(path = %path.display(), "removing previous project files");
    fs::remove_dir_all(path)?;
  }
  fs::create_dir_all(path)?;
  Ok(())
}

/// Archives directly inside `dir`, sorted by file name.
pub fn list_archives(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
  let mut archives: Vec<PathBuf> = fs::read_dir(dir)?
    .filter_map(|entry| entry.ok())
    .map(|entry| entry.path())
    .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION))
    .collect();
  archives.sort();
  Ok(archives)
}

/// Delete archives left over from earlier runs so that every archive found
/// after the build belongs to this run.
pub fn purge_stale_archives(workspace: &Path) -> Result<Vec<PathBuf>, InvokeError> {
  let stale = list_archives(workspace)?;
  for path in &stale {
    info!(path = %path.display(), "removing stale archive");
    fs::remove_file(path)?;
  }
  Ok(stale)
}

/// Number of parallel build jobs, or `None` for a serial build.
pub fn build_jobs(multithreaded: bool) -> Option<usize> {
  multithreaded.then(|| std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1))
}

/// Drives one plan through the external build tool.
pub struct Invoker<'a, R: CommandRunner> {
  runner: &'a R,
  layout: &'a ProjectLayout,
}

impl<'a, R: CommandRunner> Invoker<'a, R> {
  pub fn new(runner: &'a R, layout: &'a ProjectLayout) -> Self {
    Self { runner, layout }
  }

  pub async fn run(&self, plan: &BuildPlan) -> Result<InvokeOutcome, InvokeError> {
    let workspace = &plan.workspace.path;
    let flags = plan.request.flags;
    let mut warnings = Vec::new();

    prepare_workspace(workspace, flags.clean)?;
    let purged = purge_stale_archives(workspace)?;

    let _cwd = DirGuard::enter(workspace)?;

    self.runner.run(&self.configure(plan)).await?;

    if flags.no_build {
      info!(workspace = %plan.workspace.name, "configured only, skipping build");
      return Ok(InvokeOutcome {
        stage: InvokeStage::Configured,
        purged,
        warnings,
      });
    }

    let (build, packaging) = self.build_steps(plan, build_jobs(flags.multithreaded));
    self.runner.run(&build).await?;

    // The SQL Server project has no package/install targets; msbuild and the
    // manual assembly take their place.
    if plan.request.backend.has_native_archive() {
      if packaging.is_empty() {
        let message = format!(
          "do not know how to run package and install targets for generator {}",
          plan.generator.as_deref().unwrap_or("<default>")
        );
        warn!(family = %plan.family, "{}", message);
        warnings.push(message);
      }
      for step in &packaging {
        self.runner.run(step).await?;
      }
    }

    match plan.request.backend {
      Backend::SqlServer => {
        let assembly_dir = self.layout.sqlserver_dir();
        let _sqlserver_cwd = DirGuard::enter(&assembly_dir)?;
        self.runner.run(&self.msbuild(plan, &assembly_dir)).await?;
      }
      Backend::Utils => self.runner.run(&self.ctest(plan)).await?,
      Backend::Postgres | Backend::Oracle => {}
    }

    info!(workspace = %plan.workspace.name, "build complete");
    Ok(InvokeOutcome {
      stage: InvokeStage::Built,
      purged,
      warnings,
    })
  }

  fn configure(&self, plan: &BuildPlan) -> Invocation {
    let mut invocation = Invocation::new(CMAKE, &plan.workspace.path);
    if let Some(generator) = &plan.generator {
      invocation = invocation.arg("-G").arg(generator.as_str());
    }
    invocation = invocation.args(plan.params.iter().cloned());
    if plan.family.is_single_config() {
      invocation = invocation.arg(format!("-DCMAKE_BUILD_TYPE={}", plan.request.configuration));
    }
    invocation
      .arg(plan.project_dir.to_string_lossy())
      .envs(&plan.configure_env)
  }

  /// The build invocation plus the package/install steps for the plan's
  /// generator family. An empty step list means the family has no known
  /// packaging targets.
  fn build_steps(&self, plan: &BuildPlan, jobs: Option<usize>) -> (Invocation, Vec<Invocation>) {
    let cwd = &plan.workspace.path;
    let config = plan.request.configuration.as_str();
    let build = Invocation::new(CMAKE, cwd).args(["--build", ".", "--config", config]);
    let target = |name: &str| {
      Invocation::new(CMAKE, cwd).args(["--build", ".", "--target", name, "--config", config])
    };

    match plan.family {
      GeneratorFamily::UnixMakefiles | GeneratorFamily::MinGW => {
        let make = if plan.family == GeneratorFamily::MinGW {
          "mingw32-make"
        } else {
          "make"
        };
        let build = match jobs {
          Some(jobs) => build.arg("--").arg(format!("-j{}", jobs)),
          None => build,
        };
        let steps = vec![
          Invocation::new(make, cwd).arg("package"),
          Invocation::new(make, cwd).arg("install"),
        ];
        (build, steps)
      }
      GeneratorFamily::Xcode => (build, vec![target("package"), target("install")]),
      GeneratorFamily::VisualStudio => {
        let build = match jobs {
          Some(jobs) => build.env("CL", format!("/MP{}", jobs)),
          None => build,
        };
        (build, vec![target("PACKAGE"), target("INSTALL")])
      }
      GeneratorFamily::Unknown => (build, Vec::new()),
    }
  }

  fn msbuild(&self, plan: &BuildPlan, cwd: &Path) -> Invocation {
    let config = plan.request.configuration.as_str();
    let dll_dir = plan
      .workspace
      .path
      .join("dist")
      .join("Win64")
      .join("lib")
      .join(config);
    Invocation::new("msbuild", cwd)
      .arg("/t:Rebuild")
      .arg(format!("/p:Configuration={}", config))
      .arg(format!("/property:DllPath64={}", dll_dir.display()))
  }

  fn ctest(&self, plan: &BuildPlan) -> Invocation {
    Invocation::new("ctest", &plan.workspace.path).args([
      "-V",
      "--timeout",
      "10",
      "-C",
      plan.request.configuration.as_str(),
      ".",
    ])
  }
}

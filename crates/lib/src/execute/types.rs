//! Types for invoking the external build toolchain.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::settings::ConfigError;
use crate::toolchain::BuildArguments;

/// The three external steps of an autotools build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildStep {
  Configure,
  Build,
  Install,
}

impl BuildStep {
  pub const ALL: [BuildStep; 3] = [BuildStep::Configure, BuildStep::Build, BuildStep::Install];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Configure => "configure",
      Self::Build => "build",
      Self::Install => "install",
    }
  }
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Errors that can occur while invoking the toolchain.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// An external step exited with a nonzero status.
  #[error("{step} step failed with exit code {code:?}: {cmd}")]
  BuildFailure {
    step: BuildStep,
    cmd: String,
    code: Option<i32>,
  },

  /// An external program could not be started.
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The source tree to build in does not exist.
  #[error("working directory does not exist: {0}")]
  MissingWorkDir(PathBuf),

  /// The vendor toolchain environment could not be activated.
  #[error("toolchain activation failed: {0}")]
  Activation(String),

  /// Activation needs configuration that is missing.
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Configuration for toolchain invocation.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Shell used to run `./configure`.
  pub shell: String,

  /// Make program used for the build and install steps.
  pub make: String,

  /// Parallel jobs passed to make.
  pub jobs: usize,
}

/// Environment variable naming a bash executable for Windows hosts.
pub const BASH_PATH_ENV: &str = "LIBFORGE_BASH_PATH";

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      shell: default_shell(),
      make: std::env::var("MAKE").ok().filter(|m| !m.is_empty()).unwrap_or_else(|| "make".to_string()),
      jobs: num_cpus(),
    }
  }
}

#[cfg(unix)]
fn default_shell() -> String {
  "/bin/sh".to_string()
}

#[cfg(windows)]
fn default_shell() -> String {
  std::env::var(BASH_PATH_ENV).unwrap_or_else(|_| "bash.exe".to_string())
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// Everything the invoker needs for one build.
#[derive(Debug, Clone)]
pub struct InvokeRequest<'a> {
  /// Root of the patched source tree.
  pub source_root: PathBuf,

  /// Install prefix.
  pub package_root: PathBuf,

  /// Arguments and environment overrides from the argument builder.
  pub arguments: &'a BuildArguments,
}

/// Result of one external step.
#[derive(Debug, Clone)]
pub struct StepResult {
  pub step: BuildStep,
  pub cmd: String,
  pub elapsed: Duration,
}

/// Result of a complete configure/build/install run.
#[derive(Debug, Clone, Default)]
pub struct InvokeResult {
  pub steps: Vec<StepResult>,
}

impl InvokeResult {
  pub fn elapsed(&self) -> Duration {
    self.steps.iter().map(|s| s.elapsed).sum()
  }
}

//! Vendor toolchain environment activation.
//!
//! The MSVC tools only work inside the environment set up by `vcvarsall.bat`.
//! Activation runs that script once, dumps the resulting environment and keeps
//! the variables that differ from the current scope. The difference becomes
//! an `EnvScope` layer for the rest of the build.

use std::collections::BTreeMap;

use tracing::debug;

use crate::execute::scope::EnvScope;
use crate::execute::types::ExecuteError;
use crate::platform::{Arch, PlatformDescriptor};
use crate::settings::ConfigError;
use crate::toolchain::Activation;

/// Environment variable pointing at `vcvarsall.bat`.
pub const VCVARSALL_ENV: &str = "VCVARSALL";

/// Capture the environment changes `activation` makes for `platform`.
pub async fn activate(
  activation: Activation,
  platform: &PlatformDescriptor,
  scope: &EnvScope,
) -> Result<BTreeMap<String, String>, ExecuteError> {
  match activation {
    Activation::VsDevEnv => vs_dev_env(platform, scope).await,
  }
}

/// `vcvarsall.bat` architecture argument for a target, assuming an x64 host.
pub fn vcvars_arch(arch: Arch) -> &'static str {
  match arch {
    Arch::X86 => "amd64_x86",
    Arch::X86_64 => "amd64",
    Arch::Armv7 => "amd64_arm",
    Arch::Armv8 => "amd64_arm64",
  }
}

#[cfg(windows)]
async fn vs_dev_env(platform: &PlatformDescriptor, scope: &EnvScope) -> Result<BTreeMap<String, String>, ExecuteError> {
  use tokio::process::Command;

  let script = scope.get(VCVARSALL_ENV).ok_or_else(|| ConfigError::MissingEnv {
    var: VCVARSALL_ENV.to_string(),
    compiler: platform.compiler.to_string(),
  })?;
  let arch = vcvars_arch(platform.arch);
  tracing::info!(script = %script, arch = %arch, "activating MSVC developer environment");

  let output = Command::new("cmd.exe")
    .arg("/C")
    .arg(format!("call \"{}\" {} >NUL && set", script, arch))
    .env_clear()
    .envs(scope.resolved())
    .output()
    .await
    .map_err(|e| ExecuteError::Activation(e.to_string()))?;

  if !output.status.success() {
    return Err(ExecuteError::Activation(format!(
      "vcvarsall.bat exited with {:?}",
      output.status.code()
    )));
  }

  let dumped = parse_env_dump(&String::from_utf8_lossy(&output.stdout));
  let changes = env_changes(&scope.resolved(), &dumped);
  debug!(changed = changes.len(), "captured developer environment");
  Ok(changes)
}

#[cfg(not(windows))]
async fn vs_dev_env(platform: &PlatformDescriptor, scope: &EnvScope) -> Result<BTreeMap<String, String>, ExecuteError> {
  if scope.get(VCVARSALL_ENV).is_none() {
    return Err(
      ConfigError::MissingEnv {
        var: VCVARSALL_ENV.to_string(),
        compiler: platform.compiler.to_string(),
      }
      .into(),
    );
  }
  debug!(compiler = %platform.compiler, "developer environment requested on a non-Windows host");
  Err(ExecuteError::Activation(
    "the MSVC developer environment can only be activated on Windows hosts".to_string(),
  ))
}

/// Parse `set`/`env` output (`KEY=value` per line).
pub fn parse_env_dump(dump: &str) -> BTreeMap<String, String> {
  dump
    .lines()
    .filter_map(|line| {
      let line = line.trim_end_matches('\r');
      let (key, value) = line.split_once('=')?;
      if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
      }
      Some((key.to_string(), value.to_string()))
    })
    .collect()
}

/// Variables in `after` that are new or changed relative to `before`.
pub fn env_changes(before: &BTreeMap<String, String>, after: &BTreeMap<String, String>) -> BTreeMap<String, String> {
  after
    .iter()
    .filter(|(key, value)| before.get(*key) != Some(*value))
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect()
}

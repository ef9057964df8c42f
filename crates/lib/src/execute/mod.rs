//! Build invocation.
//!
//! Runs the three external steps of an autotools build (configure, build,
//! install) against a patched source tree. The working directory and the
//! environment are scoped values (see [`scope`]); overrides are visible to the
//! child processes only and are dropped when the invocation returns, whether
//! it succeeded or not.

pub mod activation;
pub mod cmd;
pub mod scope;
pub mod types;

use std::collections::BTreeMap;

use tracing::info;

use crate::platform::PlatformDescriptor;

pub use cmd::run_step;
pub use scope::{EnvLayer, EnvScope, EnvSource, ProcessEnv, WorkDir};
pub use types::{BuildStep, ExecuteConfig, ExecuteError, InvokeRequest, InvokeResult, StepResult};

/// Configure, build and install one source tree.
///
/// Steps run strictly in order; the first failing step aborts the build and
/// later steps never run. The source tree is left as the failed step left it.
pub async fn invoke_build(
  request: &InvokeRequest<'_>,
  platform: &PlatformDescriptor,
  scope: &mut EnvScope,
  config: &ExecuteConfig,
) -> Result<InvokeResult, ExecuteError> {
  let work_dir = WorkDir::enter(&request.source_root)?;
  let arguments = request.arguments;

  let activated_vars = match arguments.activation() {
    Some(kind) => activation::activate(kind, platform, scope).await?,
    None => BTreeMap::new(),
  };
  let mut activated = scope.push("activation", activated_vars);

  let mut overrides = arguments.env().clone();
  if let Some(cppflags) = arguments.cppflags() {
    overrides.insert("CPPFLAGS".to_string(), activated.appended("CPPFLAGS", &cppflags));
  }
  if let Some(cflags) = arguments.cflags() {
    overrides.insert("CFLAGS".to_string(), activated.appended("CFLAGS", &cflags));
    overrides.insert("CXXFLAGS".to_string(), activated.appended("CXXFLAGS", &cflags));
  }
  let layered = activated.push("recipe", overrides);
  let env = layered.resolved();

  let prefix = request.package_root.to_string_lossy().to_string();
  let mut result = InvokeResult::default();

  for step in BuildStep::ALL {
    let (program, args) = step_command(step, arguments, &prefix, config);
    let outcome = run_step(step, &program, &args, &work_dir, &env).await?;
    result.steps.push(outcome);
  }

  info!(
    source = ?work_dir.path(),
    elapsed_ms = result.elapsed().as_millis() as u64,
    "build finished"
  );
  Ok(result)
}

/// Program and arguments for one step.
pub fn step_command(
  step: BuildStep,
  arguments: &crate::toolchain::BuildArguments,
  prefix: &str,
  config: &ExecuteConfig,
) -> (String, Vec<String>) {
  match step {
    BuildStep::Configure => {
      let mut args = vec!["./configure".to_string()];
      args.extend(arguments.configure_args(prefix));
      (config.shell.clone(), args)
    }
    BuildStep::Build => (config.make.clone(), vec![format!("-j{}", config.jobs.max(1))]),
    BuildStep::Install => (config.make.clone(), vec!["install".to_string()]),
  }
}

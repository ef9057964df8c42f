//! External step execution.
//!
//! Each step runs one program with explicit arguments, in the build's working
//! directory, with an environment built from scratch out of the resolved
//! `EnvScope`. Nothing is inherited implicitly from this process.

use std::collections::BTreeMap;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::scope::WorkDir;
use crate::execute::types::{BuildStep, ExecuteError, StepResult};

/// Run one external build step to completion.
///
/// # Arguments
///
/// * `step` - Which step this is (used for logging and errors)
/// * `program` - The program to execute
/// * `args` - Arguments passed verbatim, without shell interpretation
/// * `work_dir` - Working directory for the child
/// * `env` - The complete child environment
///
/// # Errors
///
/// `ExecuteError::Spawn` if the program cannot be started and
/// `ExecuteError::BuildFailure` if it exits with a nonzero status.
pub async fn run_step(
  step: BuildStep,
  program: &str,
  args: &[String],
  work_dir: &WorkDir,
  env: &BTreeMap<String, String>,
) -> Result<StepResult, ExecuteError> {
  let cmd = render_command(program, args);
  info!(step = %step, cmd = %cmd, "running build step");

  let started = Instant::now();

  let mut command = Command::new(program);
  command
    .args(args)
    .current_dir(work_dir.path())
    .env_clear()
    .envs(env)
    // Set a minimal locale
    .env("LC_ALL", "C");

  debug!(working_dir = ?work_dir.path(), vars = env.len(), "spawning process");

  let output = command.output().await.map_err(|source| ExecuteError::Spawn {
    program: program.to_string(),
    source,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  if !stdout.trim().is_empty() {
    debug!(step = %step, stdout = %stdout.trim(), "step stdout");
  }
  if !stderr.trim().is_empty() {
    debug!(step = %step, stderr = %stderr.trim(), "step stderr");
  }

  if !output.status.success() {
    return Err(ExecuteError::BuildFailure {
      step,
      cmd,
      code: output.status.code(),
    });
  }

  Ok(StepResult {
    step,
    cmd,
    elapsed: started.elapsed(),
  })
}

/// Human-readable command line; arguments containing spaces are quoted.
pub fn render_command(program: &str, args: &[String]) -> String {
  let mut parts = vec![program.to_string()];
  for arg in args {
    if arg.contains(char::is_whitespace) {
      parts.push(format!("'{}'", arg));
    } else {
      parts.push(arg.clone());
    }
  }
  parts.join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_quotes_arguments_with_spaces() {
    let args = vec!["--enable-static".to_string(), "NM=dumpbin -symbols".to_string()];
    assert_eq!(
      render_command("sh", &args),
      "sh --enable-static 'NM=dumpbin -symbols'"
    );
  }

  #[cfg(unix)]
  mod unix {
    use super::*;
    use tempfile::TempDir;

    fn env_with_path() -> BTreeMap<String, String> {
      BTreeMap::from([("PATH".to_string(), "/usr/bin:/bin".to_string())])
    }

    #[tokio::test]
    async fn successful_step_reports_command() {
      let temp = TempDir::new().unwrap();
      let work_dir = WorkDir::enter(temp.path()).unwrap();

      let result = run_step(
        BuildStep::Build,
        "/bin/sh",
        &["-c".to_string(), "exit 0".to_string()],
        &work_dir,
        &env_with_path(),
      )
      .await
      .unwrap();

      assert_eq!(result.step, BuildStep::Build);
      assert_eq!(result.cmd, "/bin/sh -c 'exit 0'");
    }

    #[tokio::test]
    async fn step_runs_in_work_dir_with_given_env() {
      let temp = TempDir::new().unwrap();
      let work_dir = WorkDir::enter(temp.path()).unwrap();
      let mut env = env_with_path();
      env.insert("MARKER".to_string(), "from-scope".to_string());

      run_step(
        BuildStep::Configure,
        "/bin/sh",
        &["-c".to_string(), "echo \"$MARKER\" > marker.txt".to_string()],
        &work_dir,
        &env,
      )
      .await
      .unwrap();

      let marker = std::fs::read_to_string(temp.path().join("marker.txt")).unwrap();
      assert_eq!(marker.trim(), "from-scope");
    }

    #[tokio::test]
    async fn unlisted_variables_are_not_inherited() {
      let temp = TempDir::new().unwrap();
      let work_dir = WorkDir::enter(temp.path()).unwrap();

      run_step(
        BuildStep::Configure,
        "/bin/sh",
        &["-c".to_string(), "echo \"${HOME:-unset}\" > home.txt".to_string()],
        &work_dir,
        &env_with_path(),
      )
      .await
      .unwrap();

      let home = std::fs::read_to_string(temp.path().join("home.txt")).unwrap();
      assert_eq!(home.trim(), "unset");
    }

    #[tokio::test]
    async fn nonzero_exit_is_build_failure() {
      let temp = TempDir::new().unwrap();
      let work_dir = WorkDir::enter(temp.path()).unwrap();

      let result = run_step(
        BuildStep::Install,
        "/bin/sh",
        &["-c".to_string(), "exit 3".to_string()],
        &work_dir,
        &env_with_path(),
      )
      .await;

      assert!(matches!(
        result,
        Err(ExecuteError::BuildFailure {
          step: BuildStep::Install,
          code: Some(3),
          ..
        })
      ));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
      let temp = TempDir::new().unwrap();
      let work_dir = WorkDir::enter(temp.path()).unwrap();

      let result = run_step(BuildStep::Build, "/nonexistent/make", &[], &work_dir, &env_with_path()).await;

      assert!(matches!(result, Err(ExecuteError::Spawn { .. })));
    }
  }
}

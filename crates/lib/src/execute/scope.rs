//! Scoped working directory and environment for child processes.
//!
//! Neither the process-global working directory nor the process environment
//! is ever modified. Instead the invoker carries a `WorkDir` and an
//! `EnvScope` and hands both to every child it spawns. Environment overrides
//! are pushed as layers; each layer is popped when its `EnvLayer` guard is
//! dropped, so the previous view is restored on every exit path.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::{trace, warn};

use crate::execute::types::ExecuteError;

/// Read-only access to environment variables.
pub trait EnvSource {
  fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
  fn var(&self, key: &str) -> Option<String> {
    std::env::var(key).ok()
  }
}

impl EnvSource for BTreeMap<String, String> {
  fn var(&self, key: &str) -> Option<String> {
    self.get(key).cloned()
  }
}

#[derive(Debug, Clone)]
struct Layer {
  label: String,
  vars: BTreeMap<String, String>,
}

/// A base environment plus a stack of override layers.
#[derive(Debug, Clone, Default)]
pub struct EnvScope {
  base: BTreeMap<String, String>,
  layers: Vec<Layer>,
}

impl EnvScope {
  /// Snapshot the current process environment.
  ///
  /// Entries that are not valid UTF-8 cannot be passed on to the build and
  /// are skipped with a warning.
  pub fn inherit() -> Self {
    Self::from_os_vars(std::env::vars_os())
  }

  fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
    let mut base = BTreeMap::new();
    for (key, value) in vars {
      match (key.into_string(), value.into_string()) {
        (Ok(key), Ok(value)) => {
          base.insert(key, value);
        }
        (key, _) => {
          let key = key.unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
          warn!(var = %key, "skipping non-UTF-8 environment variable; the build will not see it");
        }
      }
    }
    Self::from_vars(base)
  }

  pub fn from_vars(base: BTreeMap<String, String>) -> Self {
    Self {
      base,
      layers: Vec::new(),
    }
  }

  /// Push an override layer. It stays active until the returned guard drops.
  pub fn push(&mut self, label: &str, vars: BTreeMap<String, String>) -> EnvLayer<'_> {
    trace!(layer = %label, vars = vars.len(), "pushing environment layer");
    self.layers.push(Layer {
      label: label.to_string(),
      vars,
    });
    let depth = self.layers.len();
    EnvLayer { scope: self, depth }
  }

  /// Number of active override layers.
  pub fn depth(&self) -> usize {
    self.layers.len()
  }

  /// Look up a variable, innermost layer first.
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .layers
      .iter()
      .rev()
      .find_map(|layer| layer.vars.get(key))
      .or_else(|| self.base.get(key))
      .map(String::as_str)
  }

  /// The flattened environment a child process should receive.
  pub fn resolved(&self) -> BTreeMap<String, String> {
    let mut env = self.base.clone();
    for layer in &self.layers {
      for (key, value) in &layer.vars {
        env.insert(key.clone(), value.clone());
      }
    }
    env
  }

  /// `value` appended to the current value of `key`, space separated.
  pub fn appended(&self, key: &str, value: &str) -> String {
    match self.get(key) {
      Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), value),
      _ => value.to_string(),
    }
  }
}

impl EnvSource for EnvScope {
  fn var(&self, key: &str) -> Option<String> {
    self.get(key).map(str::to_string)
  }
}

/// Guard for one environment layer. Dereferences to the scope so further
/// layers can be nested inside it.
pub struct EnvLayer<'a> {
  scope: &'a mut EnvScope,
  depth: usize,
}

impl Deref for EnvLayer<'_> {
  type Target = EnvScope;

  fn deref(&self) -> &EnvScope {
    self.scope
  }
}

impl DerefMut for EnvLayer<'_> {
  fn deref_mut(&mut self) -> &mut EnvScope {
    self.scope
  }
}

impl Drop for EnvLayer<'_> {
  fn drop(&mut self) {
    if let Some(layer) = self.scope.layers.get(self.depth - 1) {
      trace!(layer = %layer.label, "popping environment layer");
    }
    self.scope.layers.truncate(self.depth - 1);
  }
}

/// Working directory handed to every child process of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir(PathBuf);

impl WorkDir {
  /// Enter `path`, which must be an existing directory.
  pub fn enter(path: &Path) -> Result<Self, ExecuteError> {
    if !path.is_dir() {
      return Err(ExecuteError::MissingWorkDir(path.to_path_buf()));
    }
    let path = dunce::canonicalize(path)?;
    Ok(Self(path))
  }

  pub fn path(&self) -> &Path {
    &self.0
  }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::consts::{DOWNLOADS_SUBFOLDER, PACKAGE_SUBFOLDER, SOURCE_SUBFOLDER};
use crate::execute::{ExecuteConfig, ExecuteError, InvokeResult};
use crate::fetch::FetchError;
use crate::options::OptionSet;
use crate::package::{PackageError, PackageManifest};
use crate::patch::PatchError;
use crate::platform::PlatformDescriptor;
use crate::platform::paths::work_base_dir;
use crate::recipe::Recipe;
use crate::settings::{ConfigError, Settings};
use crate::toolchain::BuildArguments;

/// Any failure of a recipe build. Every variant aborts the build.
#[derive(Debug, Error)]
pub enum RecipeError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Patch(#[from] PatchError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error(transparent)]
  Package(#[from] PackageError),
}

/// Directories of one recipe build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
  pub root: PathBuf,
  pub downloads: PathBuf,
  pub sources: PathBuf,
  pub package: PathBuf,
}

impl BuildLayout {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      downloads: root.join(DOWNLOADS_SUBFOLDER),
      sources: root.join(SOURCE_SUBFOLDER),
      package: root.join(PACKAGE_SUBFOLDER),
    }
  }

  /// `<work base>/<name>-<version>`.
  pub fn default_for(recipe: &Recipe) -> Self {
    Self::new(&work_base_dir().join(recipe.id()))
  }
}

/// Inputs of one build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
  pub recipe: Recipe,
  pub settings: Settings,
  pub options: OptionSet,
  /// Extra environment (for example from a profile), layered over the process environment.
  pub env: BTreeMap<String, String>,
  pub layout: BuildLayout,
  /// Re-download and re-extract even if a source tree exists.
  pub refetch: bool,
  pub execute: ExecuteConfig,
}

/// What a successful build did.
#[derive(Debug, Clone)]
pub struct BuildReport {
  pub platform: PlatformDescriptor,
  pub arguments: BuildArguments,
  pub invoke: InvokeResult,
  pub manifest: PackageManifest,
  /// Number of patches applied to the source tree.
  pub patches_applied: usize,
  pub elapsed: Duration,
}

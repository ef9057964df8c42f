use std::path::PathBuf;

use serde::Serialize;

use crate::fetch::SourceSpec;
use crate::patch::PatchSet;
use crate::platform::Os;
use crate::toolchain::ConfigureSpec;

/// A file deleted from the source tree before configure runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreBuildRemoval {
  /// Path relative to the source root.
  pub path: PathBuf,
  /// Logged when the file is removed.
  pub reason: String,
}

impl PreBuildRemoval {
  pub fn new(path: impl Into<PathBuf>, reason: &str) -> Self {
    Self {
      path: path.into(),
      reason: reason.to_string(),
    }
  }
}

/// A library consumers link against that the platform provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemLibrary {
  pub os: Os,
  pub name: String,
}

/// Declarative description of how to build one autotools package.
#[derive(Debug, Clone)]
pub struct Recipe {
  pub name: String,
  pub version: String,
  pub description: String,
  pub homepage: String,
  pub license: String,
  pub source: SourceSpec,
  pub configure: ConfigureSpec,
  /// Patches applied on every platform, before any toolchain patches.
  pub patches: PatchSet,
  pub pre_build_removals: Vec<PreBuildRemoval>,
  /// Files copied from the source root into `<package>/licenses`.
  pub license_files: Vec<PathBuf>,
  /// Non-portable install outputs deleted from the package root.
  pub stale_artifacts: Vec<PathBuf>,
  /// Libraries the package itself provides.
  pub libraries: Vec<String>,
  pub system_libraries: Vec<SystemLibrary>,
}

impl Recipe {
  /// `<name>-<version>`, used for default work roots.
  pub fn id(&self) -> String {
    format!("{}-{}", self.name, self.version)
  }

  /// Platform libraries consumers need on `os`.
  pub fn system_libraries_for(&self, os: Os) -> Vec<String> {
    self
      .system_libraries
      .iter()
      .filter(|lib| lib.os == os)
      .map(|lib| lib.name.clone())
      .collect()
  }

  /// Every library consumers link, package libraries first.
  pub fn library_names_for(&self, os: Os) -> Vec<String> {
    let mut names = self.libraries.clone();
    names.extend(self.system_libraries_for(os));
    names
  }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Consumption metadata for an installed package.
///
/// Written as pretty JSON to `<package>/libforge-package.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
  pub name: String,
  pub version: String,
  pub license: String,
  /// `<arch>-<os>` of the build.
  pub platform: String,
  /// Everything consumers link, package libraries first.
  pub library_names: Vec<String>,
  /// The subset of `library_names` supplied by the platform.
  pub system_libraries: Vec<String>,
  /// License files, relative to the package root.
  pub license_files: Vec<String>,
  /// Files installed under `lib/`, relative to the package root.
  pub artifacts: Vec<String>,
  /// SHA-256 over the package tree, excluding the manifest itself.
  pub digest: String,
}

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("filesystem error at {path}: {message}")]
  FileSystem { path: PathBuf, message: String },

  #[error("license file not found: {0}")]
  MissingLicense(PathBuf),

  #[error("failed to serialize package manifest: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error(transparent)]
  Hash(#[from] crate::util::hash::HashError),
}

impl PackageError {
  pub(crate) fn fs(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
    Self::FileSystem {
      path: path.to_path_buf(),
      message: err.to_string(),
    }
  }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single change applied to a file in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transformation {
  /// Write a new file, creating parent directories as needed.
  Inject { content: String },

  /// Replace a substring that must occur exactly once.
  Replace { from: String, to: String },

  /// Replace every occurrence of a substring that must occur at least once.
  ReplaceAll { from: String, to: String },
}

/// A transformation bound to its target file (relative to the source root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
  pub target: PathBuf,
  pub transformation: Transformation,
}

impl Patch {
  pub fn inject(target: impl Into<PathBuf>, content: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      transformation: Transformation::Inject {
        content: content.into(),
      },
    }
  }

  pub fn replace(target: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      transformation: Transformation::Replace {
        from: from.into(),
        to: to.into(),
      },
    }
  }

  pub fn replace_all(target: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      target: target.into(),
      transformation: Transformation::ReplaceAll {
        from: from.into(),
        to: to.into(),
      },
    }
  }
}

/// Ordered list of patches, applied front to back.
pub type PatchSet = Vec<Patch>;

/// Errors that can occur while patching a source tree.
#[derive(Debug, Error)]
pub enum PatchError {
  /// The expected text does not occur the required number of times.
  #[error("patch mismatch in {path}: expected {expected}, found {found} occurrence(s) of {snippet:?}")]
  Mismatch {
    path: PathBuf,
    snippet: String,
    expected: &'static str,
    found: usize,
  },

  /// The source tree is not in the shape the patch expects.
  #[error("filesystem error at {path}: {message}")]
  FileSystem { path: PathBuf, message: String },
}

impl PatchError {
  pub(crate) fn fs(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
    Self::FileSystem {
      path: path.to_path_buf(),
      message: err.to_string(),
    }
  }
}

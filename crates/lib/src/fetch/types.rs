use std::path::PathBuf;

use thiserror::Error;

use crate::util::hash::HashError;

/// Errors that can occur while fetching or unpacking a source archive.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to fetch {url}: {message}")]
  FetchFailed { url: String, message: String },

  /// The downloaded bytes do not match the recipe's checksum.
  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("unsupported archive format: {0}")]
  UnsupportedArchive(PathBuf),

  #[error("failed to unpack {archive}: {message}")]
  Unpack { archive: PathBuf, message: String },

  #[error(transparent)]
  Hash(#[from] HashError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Archive formats the unpacker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  TarBz2,
  TarGz,
  Tar,
}

impl ArchiveKind {
  /// Detect the format from the file name.
  pub fn from_name(name: &str) -> Option<Self> {
    let name = name.to_ascii_lowercase();
    if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
      Some(Self::TarBz2)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
      Some(Self::TarGz)
    } else if name.ends_with(".tar") {
      Some(Self::Tar)
    } else {
      None
    }
  }
}

/// Where a recipe's sources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
  pub url: String,
  pub sha256: String,
}

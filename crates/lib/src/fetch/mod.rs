//! Source archive download and extraction.
//!
//! Archives are stored under the work root's `downloads/` directory, named
//! after the last URL path segment. A previously downloaded file whose
//! SHA-256 matches is reused without touching the network. `file://` URLs are
//! read from the local filesystem, which is how local mirrors are used.

mod types;
mod unpack;

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub use types::{ArchiveKind, FetchError, SourceSpec};
pub use unpack::unpack_archive;

use crate::util::hash::{hash_bytes, hash_file};

/// Download `url` into `downloads_dir`, verifying its SHA-256.
///
/// The checksum is verified before anything is written, so a mismatching
/// download never lands in the cache.
///
/// # Returns
///
/// The path of the verified archive.
pub async fn fetch_source(url: &str, expected_sha256: &str, downloads_dir: &Path) -> Result<PathBuf, FetchError> {
  fs::create_dir_all(downloads_dir).await?;

  let dest_path = downloads_dir.join(url_to_filename(url));

  if dest_path.exists() {
    debug!(path = ?dest_path, "checking cached archive");
    match hash_file(&dest_path) {
      Ok(actual) if actual.matches(expected_sha256) => {
        info!(path = ?dest_path, "using cached archive");
        return Ok(dest_path);
      }
      Ok(actual) => {
        debug!(expected = %expected_sha256, actual = %actual, "cached archive hash mismatch, re-downloading")
      }
      Err(e) => debug!(error = %e, "cached archive unreadable, re-downloading"),
    }
  }

  info!(url = %url, "fetching source");
  let bytes = download(url).await?;

  let actual = hash_bytes(&bytes);
  if !actual.matches(expected_sha256) {
    return Err(FetchError::HashMismatch {
      url: url.to_string(),
      expected: expected_sha256.to_string(),
      actual: actual.0,
    });
  }

  let mut file = fs::File::create(&dest_path).await?;
  file.write_all(&bytes).await?;
  file.flush().await?;

  info!(path = ?dest_path, size = bytes.len(), "download complete");
  Ok(dest_path)
}

/// Fetch `source` and unpack it into `sources_dir`.
///
/// Any previous contents of `sources_dir` are removed first so the tree is
/// exactly the pristine archive.
pub async fn fetch_and_unpack(source: &SourceSpec, downloads_dir: &Path, sources_dir: &Path) -> Result<PathBuf, FetchError> {
  let archive = fetch_source(&source.url, &source.sha256, downloads_dir).await?;

  if sources_dir.exists() {
    debug!(path = ?sources_dir, "removing previous source tree");
    fs::remove_dir_all(sources_dir).await?;
  }

  let (archive_path, dest) = (archive.clone(), sources_dir.to_path_buf());
  tokio::task::spawn_blocking(move || unpack_archive(&archive_path, &dest))
    .await
    .map_err(|e| FetchError::Unpack {
      archive: archive.clone(),
      message: e.to_string(),
    })??;

  Ok(archive)
}

async fn download(url: &str) -> Result<Vec<u8>, FetchError> {
  let failed = |message: String| FetchError::FetchFailed {
    url: url.to_string(),
    message,
  };

  if let Some(path) = url.strip_prefix("file://") {
    return fs::read(path).await.map_err(|e| failed(e.to_string()));
  }

  let response = reqwest::get(url).await.map_err(|e| failed(e.to_string()))?;
  if !response.status().is_success() {
    return Err(failed(format!("HTTP {}", response.status())));
  }

  let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
  Ok(bytes.to_vec())
}

/// Convert a URL to a safe file name.
///
/// Takes the last path segment without its query string and replaces
/// anything outside `[A-Za-z0-9._-]`. Falls back to a hash of the URL.
pub fn url_to_filename(url: &str) -> String {
  let last = url.rsplit('/').next().unwrap_or_default();
  let last = last.split(['?', '#']).next().unwrap_or_default();

  let sanitized: String = last
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
        c
      } else {
        '_'
      }
    })
    .collect();

  if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
    return sanitized;
  }

  format!("download_{}", &hash_bytes(url.as_bytes()).0[..16])
}

//! Declarative source patching.
//!
//! A `PatchSet` is validated against the actual file contents while it is
//! applied: a replacement whose expected text is missing (or ambiguous) fails
//! instead of silently leaving upstream source unpatched.
//!
//! Files are handled as bytes, so sources in legacy encodings patch cleanly.

mod types;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

pub use types::{Patch, PatchError, PatchSet, Transformation};

/// Apply every patch in order to the tree rooted at `source_root`.
///
/// Stops at the first failure; patches already applied stay applied.
pub fn apply_patches(patches: &[Patch], source_root: &Path) -> Result<(), PatchError> {
  if patches.is_empty() {
    return Ok(());
  }

  info!(count = patches.len(), root = ?source_root, "applying patches");
  for patch in patches {
    apply_patch(patch, source_root)?;
  }
  Ok(())
}

/// Apply a single patch.
pub fn apply_patch(patch: &Patch, source_root: &Path) -> Result<(), PatchError> {
  let path = source_root.join(&patch.target);

  match &patch.transformation {
    Transformation::Inject { content } => {
      if path.is_dir() {
        return Err(PatchError::fs(&path, "target exists and is a directory"));
      }
      if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PatchError::fs(parent, e))?;
      }
      fs::write(&path, content).map_err(|e| PatchError::fs(&path, e))?;
      debug!(path = ?path, bytes = content.len(), "injected file");
    }

    Transformation::Replace { from, to } => {
      let content = read_target(&path)?;
      let found = count_occurrences(&content, from.as_bytes());
      if found != 1 {
        return Err(mismatch(&path, from, "exactly one", found));
      }
      fs::write(&path, replace_bytes(&content, from.as_bytes(), to.as_bytes()))
        .map_err(|e| PatchError::fs(&path, e))?;
      debug!(path = ?path, "replaced text");
    }

    Transformation::ReplaceAll { from, to } => {
      let content = read_target(&path)?;
      let found = count_occurrences(&content, from.as_bytes());
      if found == 0 {
        return Err(mismatch(&path, from, "at least one", found));
      }
      fs::write(&path, replace_bytes(&content, from.as_bytes(), to.as_bytes()))
        .map_err(|e| PatchError::fs(&path, e))?;
      debug!(path = ?path, occurrences = found, "replaced text");
    }
  }

  Ok(())
}

fn read_target(path: &Path) -> Result<Vec<u8>, PatchError> {
  if !path.is_file() {
    return Err(PatchError::fs(path, "target file does not exist"));
  }
  fs::read(path).map_err(|e| PatchError::fs(path, e))
}

fn mismatch(path: &Path, from: &str, expected: &'static str, found: usize) -> PatchError {
  // First line only, capped at 60 chars
  let snippet: String = from.lines().next().unwrap_or_default().chars().take(60).collect();
  PatchError::Mismatch {
    path: path.to_path_buf(),
    snippet,
    expected,
    found,
  }
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
  if needle.is_empty() {
    return 0;
  }
  let mut count = 0;
  let mut pos = 0;
  while let Some(offset) = find(&haystack[pos..], needle) {
    count += 1;
    pos += offset + needle.len();
  }
  count
}

fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(haystack.len());
  let mut pos = 0;
  while let Some(offset) = find(&haystack[pos..], from) {
    out.extend_from_slice(&haystack[pos..pos + offset]);
    out.extend_from_slice(to);
    pos += offset + from.len();
  }
  out.extend_from_slice(&haystack[pos..]);
  out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  haystack.windows(needle.len()).position(|window| window == needle)
}

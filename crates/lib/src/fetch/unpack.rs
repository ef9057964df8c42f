//! Archive extraction.
//!
//! Release tarballs wrap everything in one top-level directory
//! (`libgpg-error-1.36/`). That component is stripped so the contents land
//! directly in the destination.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};

use crate::fetch::types::{ArchiveKind, FetchError};

/// Unpack `archive` into `dest`, stripping the top-level directory.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<(), FetchError> {
  let name = archive
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or_else(|| FetchError::UnsupportedArchive(archive.to_path_buf()))?;
  let kind = ArchiveKind::from_name(name).ok_or_else(|| FetchError::UnsupportedArchive(archive.to_path_buf()))?;

  fs::create_dir_all(dest)?;

  let reader = BufReader::new(File::open(archive)?);
  let count = match kind {
    ArchiveKind::TarBz2 => unpack_tar(BzDecoder::new(reader), archive, dest)?,
    ArchiveKind::TarGz => unpack_tar(GzDecoder::new(reader), archive, dest)?,
    ArchiveKind::Tar => unpack_tar(reader, archive, dest)?,
  };

  info!(archive = ?archive, dest = ?dest, entries = count, "unpacked archive");
  Ok(())
}

fn unpack_tar<R: Read>(reader: R, archive_path: &Path, dest: &Path) -> Result<usize, FetchError> {
  let unpack_err = |e: std::io::Error| FetchError::Unpack {
    archive: archive_path.to_path_buf(),
    message: e.to_string(),
  };

  let mut archive = Archive::new(reader);
  let mut count = 0;

  for entry in archive.entries().map_err(unpack_err)? {
    let mut entry = entry.map_err(unpack_err)?;
    let path = entry.path().map_err(unpack_err)?.into_owned();

    let Some(stripped) = strip_top_level(&path) else {
      debug!(path = ?path, "skipping archive entry");
      continue;
    };

    let dest_path = dest.join(&stripped);
    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent)?;
    }

    let kind = entry.header().entry_type();
    if kind.is_symlink() || kind.is_hard_link() {
      let target = entry
        .link_name()
        .map_err(unpack_err)?
        .map(|t| t.into_owned())
        .unwrap_or_default();
      let escape = || FetchError::Unpack {
        archive: archive_path.to_path_buf(),
        message: format!("link {} -> {} points outside the source tree", path.display(), target.display()),
      };

      if kind.is_hard_link() {
        // Hard link targets name another archive member
        let source = strip_top_level(&target).ok_or_else(escape)?;
        fs::hard_link(dest.join(source), &dest_path)?;
        count += 1;
        continue;
      }
      if !symlink_stays_inside(&stripped, &target) {
        return Err(escape());
      }
    }

    entry.unpack(&dest_path).map_err(unpack_err)?;
    count += 1;
  }

  Ok(count)
}

/// Drop the first path component. `None` for the top-level directory itself
/// and for entries that would escape the destination.
fn strip_top_level(path: &Path) -> Option<PathBuf> {
  let mut components = path.components().skip_while(|c| matches!(c, Component::CurDir));
  if !matches!(components.next()?, Component::Normal(_)) {
    return None;
  }

  let mut stripped = PathBuf::new();
  for component in components {
    match component {
      Component::Normal(part) => stripped.push(part),
      Component::CurDir => {}
      _ => return None,
    }
  }

  if stripped.as_os_str().is_empty() { None } else { Some(stripped) }
}

/// Whether a symlink at `link` (relative to the tree root) pointing at
/// `target` resolves inside the tree. Absolute targets never do.
fn symlink_stays_inside(link: &Path, target: &Path) -> bool {
  let mut depth = link.components().count().saturating_sub(1);
  for component in target.components() {
    match component {
      Component::Normal(_) => depth += 1,
      Component::CurDir => {}
      Component::ParentDir if depth > 0 => depth -= 1,
      _ => return false,
    }
  }
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::TempDir;

  fn tar_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in entries {
      let mut header = tar::Header::new_gnu();
      header.set_size(content.len() as u64);
      header.set_mode(0o644);
      header.set_cksum();
      builder.append_data(&mut header, path, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
  }

  const ENTRIES: &[(&str, &str)] = &[
    ("libgpg-error-1.36/configure", "#!/bin/sh\n"),
    ("libgpg-error-1.36/src/gpg-error.c", "int main;\n"),
    ("libgpg-error-1.36/COPYING", "license\n"),
  ];

  fn assert_unpacked(dest: &Path) {
    assert!(dest.join("configure").is_file());
    assert!(dest.join("COPYING").is_file());
    assert_eq!(
      fs::read_to_string(dest.join("src/gpg-error.c")).unwrap(),
      "int main;\n"
    );
    assert!(!dest.join("libgpg-error-1.36").exists());
  }

  #[test]
  fn unpacks_tar_bz2_stripping_top_level() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("libgpg-error-1.36.tar.bz2");
    let mut encoder = bzip2::write::BzEncoder::new(File::create(&archive).unwrap(), bzip2::Compression::default());
    encoder.write_all(&tar_bytes(ENTRIES)).unwrap();
    encoder.finish().unwrap();

    let dest = temp.path().join("sources");
    unpack_archive(&archive, &dest).unwrap();

    assert_unpacked(&dest);
  }

  #[test]
  fn unpacks_tar_gz() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.tgz");
    let mut encoder = flate2::write::GzEncoder::new(File::create(&archive).unwrap(), flate2::Compression::default());
    encoder.write_all(&tar_bytes(ENTRIES)).unwrap();
    encoder.finish().unwrap();

    let dest = temp.path().join("sources");
    unpack_archive(&archive, &dest).unwrap();

    assert_unpacked(&dest);
  }

  #[test]
  fn unpacks_plain_tar() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.tar");
    fs::write(&archive, tar_bytes(ENTRIES)).unwrap();

    let dest = temp.path().join("sources");
    unpack_archive(&archive, &dest).unwrap();

    assert_unpacked(&dest);
  }

  #[test]
  fn unknown_extension_is_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.zip");
    fs::write(&archive, b"PK").unwrap();

    let err = unpack_archive(&archive, &temp.path().join("sources")).unwrap_err();
    assert!(matches!(err, FetchError::UnsupportedArchive(_)));
  }

  #[test]
  fn corrupt_archive_is_unpack_error() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.tar.bz2");
    fs::write(&archive, b"definitely not bzip2").unwrap();

    let err = unpack_archive(&archive, &temp.path().join("sources")).unwrap_err();
    assert!(matches!(err, FetchError::Unpack { .. }));
  }

  #[test]
  fn strip_top_level_rejects_escapes() {
    assert_eq!(strip_top_level(Path::new("pkg/")), None);
    assert_eq!(strip_top_level(Path::new("pkg/a/b.c")), Some(PathBuf::from("a/b.c")));
    assert_eq!(strip_top_level(Path::new("pkg/../../etc/passwd")), None);
    assert_eq!(strip_top_level(Path::new("./pkg/a.c")), Some(PathBuf::from("a.c")));
    assert_eq!(strip_top_level(Path::new("../etc/passwd")), None);
  }

  #[test]
  fn symlink_targets_must_stay_inside() {
    assert!(symlink_stays_inside(Path::new("src/link"), Path::new("gpg-error.c")));
    assert!(symlink_stays_inside(Path::new("src/link"), Path::new("../COPYING")));
    assert!(!symlink_stays_inside(Path::new("src/link"), Path::new("../../etc")));
    assert!(!symlink_stays_inside(Path::new("link"), Path::new("/etc/passwd")));
  }

  fn tar_with_link(kind: tar::EntryType, path: &str, target: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in ENTRIES {
      let mut header = tar::Header::new_gnu();
      header.set_size(content.len() as u64);
      header.set_mode(0o644);
      header.set_cksum();
      builder.append_data(&mut header, path, content.as_bytes()).unwrap();
    }
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(kind);
    header.set_size(0);
    header.set_mode(0o777);
    builder.append_link(&mut header, path, target).unwrap();
    builder.into_inner().unwrap()
  }

  #[test]
  fn escaping_symlink_is_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.tar");
    fs::write(
      &archive,
      tar_with_link(tar::EntryType::Symlink, "libgpg-error-1.36/src/evil", "../../../outside"),
    )
    .unwrap();

    let err = unpack_archive(&archive, &temp.path().join("sources")).unwrap_err();
    assert!(matches!(err, FetchError::Unpack { ref message, .. } if message.contains("outside the source tree")));
  }

  #[cfg(unix)]
  #[test]
  fn inner_symlink_is_unpacked() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.tar");
    fs::write(
      &archive,
      tar_with_link(tar::EntryType::Symlink, "libgpg-error-1.36/src/license", "../COPYING"),
    )
    .unwrap();

    let dest = temp.path().join("sources");
    unpack_archive(&archive, &dest).unwrap();

    assert_eq!(fs::read_to_string(dest.join("src/license")).unwrap(), "license\n");
  }

  #[test]
  fn hard_link_resolves_against_stripped_tree() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.tar");
    fs::write(
      &archive,
      tar_with_link(tar::EntryType::Link, "libgpg-error-1.36/COPYING.LIB", "libgpg-error-1.36/COPYING"),
    )
    .unwrap();

    let dest = temp.path().join("sources");
    unpack_archive(&archive, &dest).unwrap();

    assert_eq!(fs::read_to_string(dest.join("COPYING.LIB")).unwrap(), "license\n");
  }

  #[test]
  fn escaping_hard_link_is_rejected() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("src.tar");
    fs::write(
      &archive,
      tar_with_link(tar::EntryType::Link, "libgpg-error-1.36/passwd", "../etc/passwd"),
    )
    .unwrap();

    let err = unpack_archive(&archive, &temp.path().join("sources")).unwrap_err();
    assert!(matches!(err, FetchError::Unpack { .. }));
  }
}

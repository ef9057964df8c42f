//! Test helpers: a fake autotools source tree and a fake `make`.
//!
//! The fake `configure` records its arguments and environment in
//! `configure.log`; the fake `make` records each invocation and, for
//! `make install`, populates the prefix found in that log.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::execute::{EnvScope, ExecuteConfig};
use crate::fetch::SourceSpec;
use crate::platform::{Arch, Compiler, Os, PlatformDescriptor};
use crate::util::hash::hash_file;

const FAKE_CONFIGURE: &str = r#"#!/bin/sh
printf '%s\n' "$@" > configure.log
env >> configure.log
"#;

/// Excerpts of the upstream files the msvc patches edit.
const GPG_ERROR_C: &str = concat!(
  "/* gpg-error.c - Determining gpg-error error codes. */\n",
  "\x0c\n",
  "static void\n",
  "i18n_init (void)\n",
  "{\n",
  "}\n",
  "\x0c\n",
  "static const char *usage_text =\n",
  "#if HAVE_W32_SYSTEM\n",
  "                \"Return the locale used for gettext\"\n",
  "#else\n",
  "                \"@\"\n",
  "#endif\n",
  "                ;\n",
);

const GPG_ERROR_H_IN: &str = concat!(
  "/* The version of this header.  */\n",
  "#undef GPGRT_HAVE_MACRO_FUNCTION\n",
  "#define GPGRT_GCC_VERSION 0\n",
);

const MAKEFILE_IN: &str = concat!(
  "_mkerrcodes.h: Makefile mkerrcodes.awk\n",
  "\t$(CPP) $(CPPFLAGS) $(extra_cppflags) -P _$@ >_$@.tmp\n",
);

const W32_ESTREAM_C: &str = concat!("#ifdef HAVE_W32_SYSTEM\n", "#include <windows.h>\n", "#endif\n");

/// Create `<root>/sources` with a fake `configure`, a license file and
/// excerpts of the sources that the msvc patches target.
pub fn fake_source_tree(root: &Path) -> PathBuf {
  let source = root.join("sources");
  fs::create_dir_all(source.join("src")).unwrap();
  fs::create_dir_all(source.join("po")).unwrap();
  write_executable(&source.join("configure"), FAKE_CONFIGURE);
  fs::write(source.join("COPYING"), "GNU LESSER GENERAL PUBLIC LICENSE\n").unwrap();
  fs::write(source.join("po").join("ro.po"), "msgid \"\"\n").unwrap();
  fs::write(source.join("src/gpg-error.c"), GPG_ERROR_C).unwrap();
  fs::write(source.join("src/gpg-error.h.in"), GPG_ERROR_H_IN).unwrap();
  fs::write(source.join("src/Makefile.in"), MAKEFILE_IN).unwrap();
  fs::write(source.join("src/w32-estream.c"), W32_ESTREAM_C).unwrap();
  source
}

/// Pack a fresh `fake_source_tree` as `libgpg-error-1.36.tar.gz` under
/// `<root>/mirror` and describe it as a `file://` source.
pub fn fake_source_archive(root: &Path) -> SourceSpec {
  let staging = root.join("staging");
  let tree = fake_source_tree(&staging);

  let mirror = root.join("mirror");
  fs::create_dir_all(&mirror).unwrap();
  let archive = mirror.join("libgpg-error-1.36.tar.gz");

  let encoder = GzEncoder::new(fs::File::create(&archive).unwrap(), Compression::default());
  let mut builder = tar::Builder::new(encoder);
  builder.append_dir_all("libgpg-error-1.36", &tree).unwrap();
  builder.into_inner().unwrap().finish().unwrap();
  fs::remove_dir_all(&staging).unwrap();

  SourceSpec {
    url: format!("file://{}", archive.display()),
    sha256: hash_file(&archive).unwrap().0,
  }
}

/// Make the file at `path` an executable script.
#[cfg(unix)]
pub fn write_executable(path: &Path, content: &str) {
  use std::os::unix::fs::PermissionsExt;

  fs::write(path, content).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A fake `make` on disk plus the log it writes.
pub struct FakeToolchain {
  make: PathBuf,
  log: PathBuf,
}

impl FakeToolchain {
  pub fn new(root: &Path) -> Self {
    let bin = root.join("bin");
    fs::create_dir_all(&bin).unwrap();
    let tools = Self {
      make: bin.join("make"),
      log: root.join("make.log"),
    };
    tools.write_make(None);
    tools
  }

  /// Make the fake `make` exit with status 2 when called with exactly `args`.
  pub fn failing_on(self, args: &str) -> Self {
    self.write_make(Some(args));
    self
  }

  fn write_make(&self, fail_on: Option<&str>) {
    let fail = fail_on
      .map(|args| format!("if [ \"$*\" = \"{}\" ]; then exit 2; fi\n", args))
      .unwrap_or_default();
    let script = format!(
      r#"#!/bin/sh
echo "$*" >> "{log}"
{fail}if [ "$1" = "install" ]; then
  prefix=$(sed -n 's/^--prefix=//p' configure.log)
  mkdir -p "$prefix/lib" "$prefix/include"
  echo archive > "$prefix/lib/libgpg-error.a"
  echo libtool > "$prefix/lib/libgpg-error.la"
  echo header > "$prefix/include/gpg-error.h"
fi
"#,
      log = self.log.display(),
      fail = fail,
    );
    write_executable(&self.make, &script);
  }

  /// Arguments of every `make` call so far, one entry per call.
  pub fn make_calls(&self) -> Vec<String> {
    fs::read_to_string(&self.log)
      .map(|log| log.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }

  pub fn config(&self) -> ExecuteConfig {
    ExecuteConfig {
      shell: "/bin/sh".to_string(),
      make: self.make.to_string_lossy().to_string(),
      jobs: 1,
    }
  }

  /// A minimal scope: just enough `PATH` for the fake scripts.
  pub fn scope(&self) -> EnvScope {
    EnvScope::from_vars(BTreeMap::from([("PATH".to_string(), "/usr/bin:/bin".to_string())]))
  }

  pub fn platform(&self) -> PlatformDescriptor {
    PlatformDescriptor::new(Os::Linux, Arch::X86_64, Compiler::Gcc)
  }
}

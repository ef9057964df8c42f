//! libgpg-error 1.36.

use std::collections::BTreeMap;

use crate::fetch::SourceSpec;
use crate::patch::{Patch, PatchSet};
use crate::platform::{Arch, Compiler, Os};
use crate::recipe::types::{PreBuildRemoval, Recipe, SystemLibrary};
use crate::toolchain::{
  Activation, ConfigureSpec, EnvNormalizer, HostTriple, RequiredEnv, ToolchainBundle, ToolchainTable,
};

pub const NAME: &str = "libgpg-error";
pub const VERSION: &str = "1.36";

const SOURCE_URL: &str = "https://www.gnupg.org/ftp/gcrypt/libgpg-error/libgpg-error-1.36.tar.bz2";
const SOURCE_SHA256: &str = "babd98437208c163175c29453f8681094bcaf92968a15cafb1a276076b33c97c";

/// POSIX shims for the MSVC runtime.
const UNISTD_H: &str = r#"
#ifdef _MSC_VER
#define access _access
#define R_OK 4
#define W_OK 2
#define X_OK R_OK
#define F_OK 0

# define S_IRWXU    0700
# define S_IRUSR    0400
# define S_IWUSR    0200
# define S_IXUSR    0100

typedef int ssize_t;
#else
#include <unistd.h>
#endif
"#;

const LOCALE_HELP_BLOCK: &str = r#"#if HAVE_W32_SYSTEM
                "Return the locale used for gettext"
#else
                "@"
#endif"#;

pub fn recipe() -> Recipe {
  Recipe {
    name: NAME.to_string(),
    version: VERSION.to_string(),
    description: "Libgpg-error is a small library that originally defined common error values for all GnuPG \
                  components."
      .to_string(),
    homepage: "https://gnupg.org/software/libgpg-error/index.html".to_string(),
    license: "GPL-2.0-or-later".to_string(),
    source: SourceSpec {
      url: SOURCE_URL.to_string(),
      sha256: SOURCE_SHA256.to_string(),
    },
    configure: ConfigureSpec {
      base_tokens: [
        "--disable-dependency-tracking",
        "--disable-nls",
        "--disable-languages",
        "--disable-doc",
        "--disable-tests",
      ]
      .map(str::to_string)
      .to_vec(),
      toolchains: ToolchainTable::new().with(Compiler::Msvc, msvc_bundle()),
      host_triples: vec![
        HostTriple::new(Some(Os::Linux), Arch::X86, None, "i686-linux-gnu"),
        HostTriple::new(None, Arch::X86, Some(Compiler::Msvc), "i686-w64-mingw32"),
        HostTriple::new(None, Arch::X86_64, Some(Compiler::Msvc), "x86_64-w64-mingw32"),
      ],
    },
    patches: PatchSet::new(),
    pre_build_removals: vec![PreBuildRemoval::new(
      "po/ro.po",
      "converting the Romanian catalog from ISO-8859-2 to UTF-8 can hang late in the build",
    )],
    license_files: vec!["COPYING".into()],
    stale_artifacts: vec!["lib/libgpg-error.la".into()],
    libraries: vec!["gpg-error".to_string()],
    system_libraries: vec![SystemLibrary {
      os: Os::Windows,
      name: "ws2_32".to_string(),
    }],
  }
}

/// Native MSVC build driven through the automake `compile`/`ar-lib` wrappers.
fn msvc_bundle() -> ToolchainBundle {
  ToolchainBundle {
    required_env: vec![RequiredEnv {
      name: "AUTOMAKE_PERLLIBDIR".to_string(),
      normalizer: EnvNormalizer::StripMountPrefix,
    }],
    env: BTreeMap::from([("_LINK_".to_string(), "advapi32.lib".to_string())]),
    tokens: [
      "CC=$${env:AUTOMAKE_PERLLIBDIR}/compile cl -nologo",
      "LD=link",
      "NM=dumpbin -symbols",
      "STRIP=:",
      "AR=$${env:AUTOMAKE_PERLLIBDIR}/ar-lib lib",
      "RANLIB=:",
      "gnupg_cv_mkdir_takes_one_arg=yes",
    ]
    .map(str::to_string)
    .to_vec(),
    defines: vec!["strncasecmp=_strnicmp".to_string(), "strcasecmp=_stricmp".to_string()],
    flags: vec!["-FS".to_string()],
    resource_compilers: vec![
      (Arch::X86, "windres --target=pe-i386".to_string()),
      (Arch::X86_64, "windres --target=pe-x86-64".to_string()),
    ],
    patches: msvc_patches(),
    activation: Some(Activation::VsDevEnv),
  }
}

fn msvc_patches() -> PatchSet {
  vec![
    Patch::inject("src/unistd.h", UNISTD_H),
    Patch::inject("src/sys/file.h", UNISTD_H),
    // Form feeds confuse cl's preprocessor
    Patch::replace_all("src/gpg-error.c", "\x0c", ""),
    Patch::replace(
      "src/gpg-error.h.in",
      "#undef GPGRT_HAVE_MACRO_FUNCTION",
      "#undef GPGRT_HAVE_MACRO_FUNCTION\n#ifdef _MSC_VER\n#define GPGRT_HAVE_MACRO_FUNCTION 1\n#endif\n",
    ),
    Patch::replace(
      "src/gpg-error.c",
      LOCALE_HELP_BLOCK,
      "                \"Return the locale used for gettext\"",
    ),
    Patch::replace(
      "src/Makefile.in",
      "$(CPP) $(CPPFLAGS) $(extra_cppflags) -P _$@",
      "$(CPP) $(CPPFLAGS) $(extra_cppflags) -EP _$@",
    ),
    Patch::replace(
      "src/w32-estream.c",
      "#include <windows.h>",
      format!("#include <windows.h>\n{}", UNISTD_H),
    ),
  ]
}

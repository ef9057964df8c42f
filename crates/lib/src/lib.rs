//! libforge-lib: platform-conditional native library builds
//!
//! This crate turns a declarative recipe for an autotools library into a
//! packaged build:
//! - `platform`: resolve settings into a `PlatformDescriptor`
//! - `patch`: apply declarative source transformations
//! - `toolchain`: assemble configure tokens and environment overrides
//! - `execute`: run configure, build and install under scoped environments
//! - `package`: collect licenses and emit a `PackageManifest`
//!
//! `pipeline::run` drives them in that order.

pub mod consts;
pub mod execute;
pub mod fetch;
pub mod options;
pub mod package;
pub mod patch;
pub mod pipeline;
pub mod placeholder;
pub mod platform;
pub mod profile;
pub mod recipe;
pub mod settings;
pub mod toolchain;
pub mod util;

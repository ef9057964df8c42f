/// Application name used for cache directories.
pub const APP_NAME: &str = "libforge";

/// Directory (relative to the work root) holding the extracted, patched source tree.
pub const SOURCE_SUBFOLDER: &str = "sources";

/// Directory (relative to the work root) receiving downloaded archives.
pub const DOWNLOADS_SUBFOLDER: &str = "downloads";

/// Directory (relative to the work root) used as the install prefix.
pub const PACKAGE_SUBFOLDER: &str = "package";

/// Directory (relative to the package root) receiving license files.
pub const LICENSES_SUBFOLDER: &str = "licenses";

/// Consumption metadata written into the package root.
pub const PACKAGE_MANIFEST_FILE: &str = "libforge-package.json";

/// Marker written into a source tree before patches are applied to it.
pub const PATCHED_MARKER_FILE: &str = ".libforge-patched";

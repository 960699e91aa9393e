//! Compile-time build metadata exposed to the CLI.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("CODEMATE_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("CODEMATE_BUILD_TIMESTAMP");

/// Render the version block used by `codemate --version`.
pub fn cli_version_text() -> String {
    format!("{VERSION}\ncommit: {GIT_COMMIT}\nbuilt: {BUILD_TIMESTAMP}")
}

/// Render the one-line banner shown when a chat session starts.
pub fn startup_metadata_line() -> String {
    format!("codemate v{VERSION} ({GIT_COMMIT})")
}

//! Constants used across the rubysuite workspace.

/// The filename for the suite's configuration.
pub const CONFIG_FILE: &str = "suite.toml";

/// The default host build framework executable.
pub const DEFAULT_HOST_PROGRAM: &str = "mx";

/// Directories whose direct entries are shipped as documentation.
pub const DOC_LEGAL_DIR: &str = "doc/legal";
pub const DOC_USER_DIR: &str = "doc/user";

/// Extension of the top-level markdown files shipped as documentation.
pub const DOC_MARKDOWN_EXT: &str = "md";

/// The launcher entry point, relative to the suite root.
pub const LAUNCHER_LINK: &str = "bin/truffleruby";

/// The prebuilt native launcher copied into place on darwin.
pub const NATIVE_LAUNCHER_DARWIN: &str = "tool/native_launcher_darwin";

/// Symlink target of the launcher on every other platform.
pub const LAUNCHER_SCRIPT: &str = "truffleruby.sh";

/// Gem variables that must not leak into the compatibility test run.
pub const GEM_ENV_VARS: [&str; 3] = ["GEM_HOME", "GEM_PATH", "GEM_ROOT"];

/// Binaries are only deployed from this branch.
pub const PRIMARY_BRANCH: &str = "master";

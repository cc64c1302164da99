//! Project-wide constants.

use std::path::PathBuf;

/// Query prefix the launcher routes to this plugin (see `plugin.ron`).
pub const DEFAULT_PREFIX: &str = "gp ";

/// The launcher shows this many rows; more would only be hidden.
pub const DEFAULT_MAX_RESULTS: usize = 19;

pub const PASSWORD_ICON: &str = "dialog-password";

pub const DEFAULT_DESCRIPTION: &str = "Copy password to clipboard";

/// Requests buffered between the stdin reader and the dispatch loop.
pub const REQUEST_QUEUE_DEPTH: usize = 64;

/// Binary name looked up when no explicit path is configured.
pub const GOPASS_BIN: &str = "gopass";

/// Log file used for a bare `--log-file`: `<state dir>/gopass-launcher/plugin.log`,
/// falling back to the cache dir and then the temp dir.
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(env!("CARGO_PKG_NAME"))
        .join("plugin.log")
}

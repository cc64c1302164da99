//! Command-line and environment configuration.
//!
//! Every flag has a `GOPASS_LAUNCHER_*` environment fallback because
//! pop-launcher starts the plugin without arguments.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::activate::clipboard::ClipboardConfig;
use crate::consts::{
    DEFAULT_DESCRIPTION, DEFAULT_MAX_RESULTS, DEFAULT_PREFIX, GOPASS_BIN, PASSWORD_ICON,
    default_log_path,
};
use crate::search::gopass::GopassSearchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "gopass-launcher",
    version,
    about = "pop-launcher plugin for searching a gopass store."
)]
pub struct Args {
    /// Path to the gopass binary (discovered on PATH and in Go install dirs when unset)
    #[arg(long, env = "GOPASS_LAUNCHER_GOPASS")]
    pub gopass: Option<PathBuf>,

    /// Prefix stripped from incoming queries
    #[arg(long, env = "GOPASS_LAUNCHER_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Maximum number of results per search
    #[arg(long, env = "GOPASS_LAUNCHER_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,

    /// Icon name shown next to each result
    #[arg(long, env = "GOPASS_LAUNCHER_ICON", default_value = PASSWORD_ICON)]
    pub icon: String,

    /// Do not send an icon with results
    #[arg(long, default_value_t = false)]
    pub no_icon: bool,

    /// Description shown under each result
    #[arg(long, env = "GOPASS_LAUNCHER_DESCRIPTION", default_value = DEFAULT_DESCRIPTION)]
    pub description: String,

    /// Command started after copying, e.g. a key injector that pastes
    #[arg(long, env = "GOPASS_LAUNCHER_PASTE_COMMAND")]
    pub paste_command: Option<String>,

    /// Append logs to a file instead of stderr (bare flag uses the default location)
    #[arg(long, env = "GOPASS_LAUNCHER_LOG_FILE", num_args = 0..=1)]
    pub log_file: Option<Option<PathBuf>>,

    /// Log output format
    #[arg(long, env = "GOPASS_LAUNCHER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Most verbose level that is logged
    #[arg(long, env = "GOPASS_LAUNCHER_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// `None` logs to stderr.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
    pub level: LogLevel,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub search: GopassSearchConfig,
    pub clipboard: ClipboardConfig,
    pub log: LogSettings,
}

impl Settings {
    /// Resolve parsed arguments. `env` looks up variables used for gopass
    /// discovery.
    pub fn resolve<F>(args: Args, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if args.max_results == 0 {
            bail!("--max-results must be at least 1");
        }

        let gopass = args.gopass.unwrap_or_else(|| locate_gopass(&env));

        let paste_command = match args.paste_command.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(cmd) => Some(
                shell_words::split(cmd)
                    .with_context(|| format!("invalid --paste-command: {cmd}"))?,
            ),
        };

        let icon = if args.no_icon || args.icon.is_empty() {
            None
        } else {
            Some(args.icon)
        };

        Ok(Self {
            search: GopassSearchConfig {
                gopass: gopass.clone(),
                prefix: args.prefix,
                max_results: args.max_results,
                description: args.description,
                icon,
            },
            clipboard: ClipboardConfig {
                gopass,
                paste_command,
            },
            log: LogSettings {
                file: args.log_file.map(|file| file.unwrap_or_else(default_log_path)),
                format: args.log_format,
                level: args.log_level,
            },
        })
    }
}

/// Find the gopass binary: `PATH` first, then the Go install locations
/// (`$GOBIN`, `$GOPATH/bin`, `$HOME/go/bin`). Falls back to the bare name
/// and lets the OS report the failure later.
pub fn locate_gopass<F>(env: F) -> PathBuf
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(path) = env("PATH") {
        for dir in std::env::split_paths(&path) {
            let candidate = dir.join(GOPASS_BIN);
            if is_executable(&candidate) {
                return candidate;
            }
        }
    }

    let go_dirs = [
        env("GOBIN").map(PathBuf::from),
        env("GOPATH").map(|p| PathBuf::from(p).join("bin")),
        env("HOME").map(|p| PathBuf::from(p).join("go").join("bin")),
    ];
    for dir in go_dirs.into_iter().flatten() {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(GOPASS_BIN);
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from(GOPASS_BIN)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

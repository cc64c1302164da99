//! Diagnostic logging. stdout belongs to the launcher protocol, so logs go to
//! stderr or an append-only file.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::{LogFormat, LogSettings};

fn make_writer(settings: &LogSettings) -> Result<BoxMakeWriter> {
    let Some(path) = &settings.file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

/// Install the global subscriber. Call once, before the runtime starts.
pub fn init(settings: &LogSettings) -> Result<()> {
    let writer = make_writer(settings)?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(settings.level))
        .with_timer(UtcTime::rfc_3339())
        .with_ansi(false)
        .with_writer(writer);

    match settings.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(
            builder
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        ),
    }
    .context("failed to install log subscriber")
}

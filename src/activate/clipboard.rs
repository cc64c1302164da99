//! Copies the selected secret to the clipboard with `gopass show -C`.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::ActivationHandler;

/// Configuration for [`GopassClipboard`].
#[derive(Debug, Clone, Default)]
pub struct ClipboardConfig {
    pub gopass: PathBuf,
    /// Program and arguments started after a successful copy, typically a
    /// key injector that presses paste in the focused window.
    pub paste_command: Option<Vec<String>>,
}

pub struct GopassClipboard {
    config: ClipboardConfig,
}

impl GopassClipboard {
    pub fn new(config: ClipboardConfig) -> Self {
        Self { config }
    }

    /// Start the paste command and let it run on its own.
    fn spawn_paste(argv: &[String]) -> Result<()> {
        let (program, args) = argv
            .split_first()
            .context("paste command is empty")?;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start paste command {program}"))?;
        debug!(pid = child.id(), program = %program, "paste command started");
        Ok(())
    }
}

#[async_trait]
impl ActivationHandler for GopassClipboard {
    async fn activate(&self, entry: &str) -> Result<()> {
        let gopass = &self.config.gopass;
        let output = Command::new(gopass)
            .args(["show", "-C", entry])
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to run {}", gopass.display()))?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            bail!(
                "gopass show -C failed: exit code {}, output: {}",
                output.status.code().unwrap_or(-1),
                combined.trim()
            );
        }
        info!(entry, "copied secret to clipboard");

        if let Some(argv) = &self.config.paste_command {
            Self::spawn_paste(argv)?;
        }
        Ok(())
    }
}

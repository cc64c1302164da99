use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use super::ActivationHandler;

/// Records every activation. Optionally fails each one.
#[derive(Default)]
pub struct MockActivator {
    error: Option<String>,
    activated: Mutex<Vec<String>>,
}

impl MockActivator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn activated(&self) -> Vec<String> {
        self.activated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ActivationHandler for MockActivator {
    async fn activate(&self, entry: &str) -> Result<()> {
        self.activated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.to_string());
        if let Some(message) = &self.error {
            bail!("{message}");
        }
        Ok(())
    }
}

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use super::{CancelToken, ResultSink, SearchProvider, SearchResult};

/// A scripted provider for tests. Streams the same results for every query
/// and remembers which queries it was asked. Stops early once cancelled.
pub struct MockSearch {
    results: Vec<SearchResult>,
    error: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            error: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fail with `message` after streaming the scripted results.
    pub fn failing_after(results: Vec<SearchResult>, message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::new(results)
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(
        &self,
        query: &str,
        cancel: &CancelToken,
        results: &mut ResultSink,
    ) -> Result<()> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        for result in &self.results {
            if cancel.is_cancelled() {
                return Ok(());
            }
            results.append(result.clone()).await?;
        }

        if let Some(message) = &self.error {
            bail!("{message}");
        }
        Ok(())
    }
}

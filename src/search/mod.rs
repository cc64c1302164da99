pub mod cancel;
pub mod gopass;
pub mod mock;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::engine::output::Responder;
use crate::protocol::{IconSource, PluginSearchResult, Response};

pub use cancel::{CancelHandle, CancelToken};

/// One item produced by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Handed back verbatim to the activation handler.
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
}

impl SearchResult {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Where a provider streams its results.
///
/// Every append is written to the launcher immediately as an `Append` line,
/// with ids assigned in emission order from 0. The names collected here
/// become the result table once the search ends.
pub struct ResultSink {
    responder: Responder,
    names: Vec<String>,
}

impl ResultSink {
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            names: Vec::new(),
        }
    }

    pub async fn append(&mut self, result: SearchResult) -> Result<()> {
        let id = u32::try_from(self.names.len()).context("too many results")?;
        let response = Response::Append(PluginSearchResult {
            id,
            name: result.name.clone(),
            description: result.description,
            icon: result.icon.map(IconSource::named),
        });
        self.responder.send(&response).await?;
        self.names.push(result.name);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Produces results for a query.
///
/// Implementations must check `cancel` at least once per result and return
/// promptly once it fires; the engine blocks until they do.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        cancel: &CancelToken,
        results: &mut ResultSink,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn append_assigns_sequential_ids() {
        let (writer, reader) = tokio::io::duplex(4096);
        let mut sink = ResultSink::new(Responder::new(writer));

        sink.append(SearchResult::new("a", "first")).await.unwrap();
        sink.append(SearchResult::new("b", "second").with_icon("dialog-password"))
            .await
            .unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.into_names(), vec!["a", "b"]);

        let mut lines = BufReader::new(reader).lines();
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            r#"{"Append":{"id":0,"name":"a","description":"first"}}"#
        );
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            r#"{"Append":{"id":1,"name":"b","description":"second","icon":{"Name":"dialog-password"}}}"#
        );
    }

    #[tokio::test]
    async fn failed_write_does_not_record_name() {
        let (writer, reader) = tokio::io::duplex(64);
        drop(reader);
        let mut sink = ResultSink::new(Responder::new(writer));

        assert!(sink.append(SearchResult::new("lost", "")).await.is_err());
        assert!(sink.is_empty());
    }
}

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::protocol::Response;

type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared handle to the outbound stream.
///
/// Clones share one lock; each [`Responder::send`] encodes, writes and
/// flushes exactly one line while holding it, so lines from the dispatch
/// loop and a search task never interleave.
#[derive(Clone)]
pub struct Responder {
    out: Arc<Mutex<Sink>>,
}

impl Responder {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub async fn send(&self, response: &Response) -> Result<()> {
        let mut out = self.out.lock().await;
        let mut line = response.encode()?;
        debug!(response = %line, "sending response");
        line.push('\n');
        out.write_all(line.as_bytes())
            .await
            .context("failed to write response")?;
        out.flush().await.context("failed to flush response")?;
        Ok(())
    }
}

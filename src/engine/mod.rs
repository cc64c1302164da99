//! The session engine: reads launcher requests, runs at most one search at a
//! time and guarantees every blocking request ends in exactly one
//! `"Finished"` (or `"Close"` for activations).

pub mod output;

use anyhow::Result;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::activate::ActivationHandler;
use crate::consts::REQUEST_QUEUE_DEPTH;
use crate::protocol::{Request, Response};
use crate::search::{self, CancelHandle, CancelToken, ResultSink, SearchProvider};
use output::Responder;

/// Names of the most recent search's results, indexed by `Append` id.
type ResultTable = Arc<Mutex<Vec<String>>>;

/// The in-flight search. Kept until the dispatch loop joins it, even after
/// the task has finished on its own.
struct ActiveSearch {
    cancel: CancelHandle,
    done: JoinHandle<()>,
}

/// One plugin session over a pair of byte streams.
pub struct Session {
    provider: Arc<dyn SearchProvider>,
    handler: Arc<dyn ActivationHandler>,
    results: ResultTable,
    active: Option<ActiveSearch>,
}

impl Session {
    pub fn new(provider: Arc<dyn SearchProvider>, handler: Arc<dyn ActivationHandler>) -> Self {
        Self {
            provider,
            handler,
            results: Arc::new(Mutex::new(Vec::new())),
            active: None,
        }
    }

    /// Serve requests from `input` until `"Exit"` or end of input.
    ///
    /// Only failing to write a response is an error; everything the driver
    /// or the collaborators get wrong is logged and skipped.
    pub async fn run<R, W>(mut self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let responder = Responder::new(output);
        let mut requests = spawn_reader(input);

        while let Some(line) = requests.recv().await {
            debug!(request = %line, "received request");

            let request = match Request::decode(&line) {
                Ok(request) => request,
                Err(e) => {
                    warn!("{e:#}: {line}");
                    continue;
                }
            };

            match request {
                Request::Exit => {
                    info!("exiting");
                    self.cancel_search(&responder).await?;
                    responder.send(&Response::Finished).await?;
                    return Ok(());
                }
                Request::Interrupt => {
                    info!("interrupted");
                    // A cancelled search writes its own Finished.
                    if !self.cancel_search(&responder).await? {
                        responder.send(&Response::Finished).await?;
                    }
                }
                Request::Search(query) => {
                    self.cancel_search(&responder).await?;
                    self.start_search(query, responder.clone());
                }
                Request::Activate(id) => {
                    self.cancel_search(&responder).await?;
                    self.activate(id).await;
                    responder.send(&Response::Close).await?;
                }
                Request::Unhandled(raw) => {
                    warn!("unhandled request: {raw}");
                }
            }
        }

        info!("input closed");
        self.cancel_search(&responder).await?;
        Ok(())
    }

    fn start_search(&mut self, query: String, responder: Responder) {
        let (cancel, token) = search::cancel::pair();
        let provider = Arc::clone(&self.provider);
        let results = Arc::clone(&self.results);

        let done = tokio::spawn(async move {
            run_search(provider, query, token, responder, results).await;
        });
        self.active = Some(ActiveSearch { cancel, done });
    }

    /// Cancel the active search, if any, and wait until it has written its
    /// Finished. Returns whether there was one.
    async fn cancel_search(&mut self, responder: &Responder) -> Result<bool> {
        let Some(active) = self.active.take() else {
            return Ok(false);
        };

        active.cancel.cancel();
        if let Err(e) = active.done.await {
            error!("search task failed: {e}");
            // It never got to write its own Finished.
            responder.send(&Response::Finished).await?;
        }
        Ok(true)
    }

    async fn activate(&self, id: u32) {
        let entry = {
            let table = self.results.lock().unwrap_or_else(PoisonError::into_inner);
            match table.get(id as usize) {
                Some(entry) => entry.clone(),
                None => {
                    error!(
                        "activate id={id} out of range (have {} results)",
                        table.len()
                    );
                    return;
                }
            }
        };

        info!(id, entry = %entry, "activating");
        if let Err(e) = self.handler.activate(&entry).await {
            error!("activate failed: {e:#}");
        }
    }
}

/// Body of one search task: Clear, the provider's Appends, publish, Finished.
async fn run_search(
    provider: Arc<dyn SearchProvider>,
    query: String,
    cancel: CancelToken,
    responder: Responder,
    results: ResultTable,
) {
    debug!(query = %query, "search started");
    if let Err(e) = responder.send(&Response::Clear).await {
        error!("search abandoned: {e:#}");
        results.lock().unwrap_or_else(PoisonError::into_inner).clear();
        return;
    }

    let mut sink = ResultSink::new(responder.clone());
    if let Err(e) = provider.search(&query, &cancel, &mut sink).await {
        error!("search failed: {e:#}");
    }

    let names = sink.into_names();
    debug!(count = names.len(), cancelled = cancel.is_cancelled(), "search ended");
    *results.lock().unwrap_or_else(PoisonError::into_inner) = names;

    if let Err(e) = responder.send(&Response::Finished).await {
        error!("{e:#}");
    }
}

/// Forward input lines over a bounded channel so the dispatch loop never
/// blocks on the reader while a search is writing.
///
/// Lines are read as raw bytes. One that is not UTF-8 is logged and skipped;
/// only an I/O error or end of input stops the reader.
fn spawn_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
    tokio::spawn(async move {
        let mut input = BufReader::new(input);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("input read error: {e}");
                    break;
                }
            }

            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = match String::from_utf8(std::mem::take(&mut buf)) {
                Ok(line) => line,
                Err(e) => {
                    warn!("skipping request that is not UTF-8: {e}");
                    continue;
                }
            };
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

//! Background worker that runs the engine off the caller's thread.
//!
//! Inputs are moved into the worker and responses moved back over channels.
//! Every submission gets an increasing id; responses to superseded
//! submissions are dropped on receipt, so a caller only ever sees the result
//! of its most recent snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info};

use crate::extract::{run_engine, EngineInput, EngineResponse};

/// Request sent to the background worker
#[derive(Debug)]
pub enum ProjectionRequest {
    /// Run the engine on a parameter snapshot
    Run { id: u64, input: Box<EngineInput> },
    /// Graceful shutdown
    Shutdown,
}

/// Response from the background worker, tagged with its request id
#[derive(Debug)]
pub struct ProjectionResponse {
    pub id: u64,
    pub response: EngineResponse,
}

/// Background worker that owns one projection thread
pub struct ProjectionWorker {
    request_tx: Sender<ProjectionRequest>,
    response_rx: Receiver<ProjectionResponse>,
    latest_id: AtomicU64,
    thread: Option<JoinHandle<()>>,
}

impl ProjectionWorker {
    pub fn new() -> Self {
        let (request_tx, request_rx) = channel();
        let (response_tx, response_rx) = channel();

        let thread = thread::spawn(move || run_worker(request_rx, response_tx));

        Self {
            request_tx,
            response_rx,
            latest_id: AtomicU64::new(0),
            thread: Some(thread),
        }
    }

    /// Queue a run; returns its id, or `None` if the worker has stopped
    pub fn submit(&self, input: EngineInput) -> Option<u64> {
        let id = self.latest_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.request_tx
            .send(ProjectionRequest::Run {
                id,
                input: Box::new(input),
            })
            .ok()
            .map(|_| id)
    }

    /// Id of the most recent submission (0 before any)
    pub fn latest_id(&self) -> u64 {
        self.latest_id.load(Ordering::SeqCst)
    }

    /// Non-blocking: the latest submission's response if it has arrived.
    /// Stale responses received on the way are discarded.
    pub fn try_latest(&self) -> Option<EngineResponse> {
        let latest = self.latest_id();
        let mut found = None;
        while let Ok(response) = self.response_rx.try_recv() {
            if response.id == latest {
                found = Some(response.response);
            } else {
                debug!("Dropping stale response {} (latest is {})", response.id, latest);
            }
        }
        found
    }

    /// Block until the latest submission's response arrives
    pub fn wait_latest(&self) -> Option<EngineResponse> {
        loop {
            let response = self.response_rx.recv().ok()?;
            let latest = self.latest_id();
            if response.id == latest {
                return Some(response.response);
            }
            debug!("Dropping stale response {} (latest is {})", response.id, latest);
        }
    }

    /// Shutdown the worker thread
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(ProjectionRequest::Shutdown);
    }
}

impl Default for ProjectionWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProjectionWorker {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_worker(request_rx: Receiver<ProjectionRequest>, response_tx: Sender<ProjectionResponse>) {
    while let Ok(request) = request_rx.recv() {
        match request {
            ProjectionRequest::Shutdown => break,
            ProjectionRequest::Run { id, input } => {
                info!("Starting projection request {}", id);
                let response = run_engine(&input);
                if response_tx.send(ProjectionResponse { id, response }).is_err() {
                    break;
                }
            }
        }
    }
}

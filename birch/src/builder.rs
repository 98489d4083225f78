//! Background build coordinator.
//!
//! Parsing and tree materialization run off the interactive path: each
//! build request spawns a worker that receives an owned snapshot of the
//! text and sends back either a materialized outline root or a parse error.
//! Requests are totally ordered by a generation counter; only the most
//! recently requested generation may ever reach the visible tree. A
//! superseded worker is signaled to stop, and if its result still arrives
//! it is discarded on receipt. Shutdown joins every outstanding worker so
//! no background thread outlives the coordinator.

use crate::outline::{self, OutlineNode};
use birch_markup::{parse, ParseError};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, TryRecvError},
        Arc,
    },
    thread::JoinHandle,
};

/// Build state for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Building,
    Ready,
    Failed,
}

struct BuildOutcome {
    generation: u64,
    result: Result<OutlineNode, ParseError>,
}

/// Coordinates background tree builds for a single document.
///
/// All methods are called from the interactive side; workers communicate
/// exclusively through the channel.
pub struct BuildCoordinator {
    state: BuildState,
    generation: u64,
    tx: Sender<BuildOutcome>,
    rx: Receiver<BuildOutcome>,
    /// Stop flag of the in-flight build, if any.
    cancel: Option<Arc<AtomicBool>>,
    workers: Vec<JoinHandle<()>>,
}

impl BuildCoordinator {
    pub fn new() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            state: BuildState::Idle,
            generation: 0,
            tx,
            rx,
            cancel: None,
            workers: Vec::new(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Generation of the most recent request. Zero before any request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new build from an owned snapshot of the text, superseding
    /// any build still in flight. Returns the new generation.
    pub fn request_build(&mut self, text: String) -> u64 {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
        self.reap_finished();

        self.generation += 1;
        self.state = BuildState::Building;
        let generation = self.generation;
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&cancel));
        let tx = self.tx.clone();

        tracing::debug!(generation, bytes = text.len(), "starting background build");
        let worker = std::thread::spawn(move || {
            let result = parse(&text).map(|root| outline::materialize_root(&root));
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!(generation, "build cancelled before delivery");
                return;
            }
            // The coordinator may already be gone; nothing to deliver to.
            let _ = tx.send(BuildOutcome { generation, result });
        });
        self.workers.push(worker);
        generation
    }

    /// Drains completed builds without blocking.
    ///
    /// Results from superseded generations are discarded; the result of the
    /// current generation, if it arrived, moves the state to `Ready` or
    /// `Failed` and is returned.
    pub fn poll(&mut self) -> Option<Result<OutlineNode, ParseError>> {
        let mut current = None;
        loop {
            match self.rx.try_recv() {
                Ok(outcome) if outcome.generation == self.generation => {
                    current = Some(outcome.result);
                }
                Ok(outcome) => {
                    tracing::debug!(
                        stale = outcome.generation,
                        current = self.generation,
                        "discarding superseded build result"
                    );
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.reap_finished();
        if let Some(result) = &current {
            self.accept(result.is_ok());
        }
        current
    }

    /// Blocks until the current generation's build completes.
    ///
    /// Returns `None` when no build is in flight. Stale results received
    /// while waiting are discarded, exactly as in [`poll`](Self::poll).
    pub fn wait(&mut self) -> Option<Result<OutlineNode, ParseError>> {
        if self.state != BuildState::Building {
            return None;
        }
        loop {
            match self.rx.recv() {
                Ok(outcome) if outcome.generation == self.generation => {
                    let ok = outcome.result.is_ok();
                    self.accept(ok);
                    self.reap_finished();
                    return Some(outcome.result);
                }
                Ok(_) => continue,
                // All senders gone; cannot happen while we hold `tx`, but
                // do not spin if it somehow does.
                Err(_) => return None,
            }
        }
    }

    /// Cancels any in-flight build and joins all workers.
    pub fn shutdown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    fn accept(&mut self, ok: bool) {
        self.state = if ok { BuildState::Ready } else { BuildState::Failed };
        self.cancel = None;
    }

    /// Joins workers that have already exited, keeping the vector short.
    fn reap_finished(&mut self) {
        let mut still_running = Vec::new();
        for worker in self.workers.drain(..) {
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                still_running.push(worker);
            }
        }
        self.workers = still_running;
    }

    #[cfg(test)]
    fn inject_outcome(&self, generation: u64, result: Result<OutlineNode, ParseError>) {
        // Simulates a slow worker delivering after being superseded.
        let _ = self.tx.send(BuildOutcome { generation, result });
    }
}

impl Default for BuildCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BuildCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

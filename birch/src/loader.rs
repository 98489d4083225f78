//! Background file loading.
//!
//! Reading a document off disk never blocks the interactive side: a worker
//! thread reads the file to a string and reports back over a channel, with
//! a coarse progress value (a single jump to 100 -- finer granularity is a
//! quality-of-implementation choice, not a contract). Like the build
//! coordinator, loads are generation-counted: starting a new load
//! supersedes the previous one, and shutdown joins every worker.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, TryRecvError},
        Arc,
    },
    thread::JoinHandle,
};
use thiserror::Error;

/// A successfully loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub text: String,
}

/// File read failure, surfaced to the user and never fatal.
#[derive(Debug, Error)]
#[error("failed to read {}: {source}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Progress or completion of the current load.
#[derive(Debug)]
pub enum LoadEvent {
    /// Coarse progress, 0..=100.
    Progress(u8),
    Finished(Result<LoadedFile, LoadError>),
}

struct LoadMessage {
    generation: u64,
    event: LoadEvent,
}

/// Coordinates background file loads for a single document.
pub struct FileLoader {
    generation: u64,
    tx: Sender<LoadMessage>,
    rx: Receiver<LoadMessage>,
    cancel: Option<Arc<AtomicBool>>,
    workers: Vec<JoinHandle<()>>,
}

impl FileLoader {
    pub fn new() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            generation: 0,
            tx,
            rx,
            cancel: None,
            workers: Vec::new(),
        }
    }

    /// Starts reading `path` on a worker thread, superseding any load still
    /// in flight. Returns the new generation.
    pub fn request_load(&mut self, path: PathBuf) -> u64 {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
        self.reap_finished();

        self.generation += 1;
        let generation = self.generation;
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&cancel));
        let tx = self.tx.clone();

        tracing::debug!(generation, path = %path.display(), "starting background load");
        let worker = std::thread::spawn(move || {
            let result = std::fs::read_to_string(&path)
                .map(|text| LoadedFile {
                    path: path.clone(),
                    text,
                })
                .map_err(|source| LoadError { path, source });
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            let _ = tx.send(LoadMessage {
                generation,
                event: LoadEvent::Progress(100),
            });
            let _ = tx.send(LoadMessage {
                generation,
                event: LoadEvent::Finished(result),
            });
        });
        self.workers.push(worker);
        generation
    }

    /// Drains pending events for the current load without blocking; events
    /// from superseded loads are discarded. Once the current load's
    /// `Finished` event is drained, the load is no longer outstanding and
    /// [`wait`](Self::wait) returns `None`.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) if message.generation == self.generation => {
                    if matches!(message.event, LoadEvent::Finished(_)) {
                        self.cancel = None;
                    }
                    events.push(message.event);
                }
                Ok(message) => {
                    tracing::debug!(
                        stale = message.generation,
                        current = self.generation,
                        "discarding superseded load event"
                    );
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.reap_finished();
        events
    }

    /// Blocks until the current load finishes. `None` when no load was
    /// requested since the last completion.
    pub fn wait(&mut self) -> Option<Result<LoadedFile, LoadError>> {
        self.cancel.as_ref()?;
        loop {
            match self.rx.recv() {
                Ok(message) if message.generation == self.generation => {
                    if let LoadEvent::Finished(result) = message.event {
                        self.cancel = None;
                        self.reap_finished();
                        return Some(result);
                    }
                }
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Cancels any in-flight load and joins all workers.
    pub fn shutdown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

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
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FileLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_file_to_string() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<root><a>1</a></root>").unwrap();

        let mut loader = FileLoader::new();
        loader.request_load(file.path().to_path_buf());
        let loaded = loader.wait().unwrap().unwrap();
        assert_eq!(loaded.text, "<root><a>1</a></root>");
        assert_eq!(loaded.path, file.path());
    }

    #[test]
    fn missing_file_reports_an_io_error() {
        let mut loader = FileLoader::new();
        loader.request_load(PathBuf::from("/definitely/not/here.xml"));
        let err = loader.wait().unwrap().unwrap_err();
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
        assert!(err.to_string().contains("not/here.xml"));
    }

    #[test]
    fn progress_reaches_one_hundred() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<a/>").unwrap();

        let mut loader = FileLoader::new();
        loader.request_load(file.path().to_path_buf());
        // Wait for delivery, then inspect the queued events.
        while loader.workers.iter().any(|w| !w.is_finished()) {
            std::thread::yield_now();
        }
        let events = loader.poll();
        assert!(matches!(events.first(), Some(LoadEvent::Progress(100))));
        assert!(matches!(events.last(), Some(LoadEvent::Finished(Ok(_)))));
    }

    #[test]
    fn wait_after_poll_has_drained_the_result_returns_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<a/>").unwrap();

        let mut loader = FileLoader::new();
        loader.request_load(file.path().to_path_buf());
        while loader.workers.iter().any(|w| !w.is_finished()) {
            std::thread::yield_now();
        }
        let events = loader.poll();
        assert!(matches!(events.last(), Some(LoadEvent::Finished(Ok(_)))));
        // The load completed through poll; nothing is outstanding, so wait
        // must not block.
        assert!(loader.wait().is_none());
    }

    #[test]
    fn newer_load_supersedes_an_older_one() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        write!(first, "first").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        write!(second, "second").unwrap();

        let mut loader = FileLoader::new();
        loader.request_load(first.path().to_path_buf());
        loader.request_load(second.path().to_path_buf());
        let loaded = loader.wait().unwrap().unwrap();
        assert_eq!(loaded.text, "second");
        assert!(loader.wait().is_none());
    }

    #[test]
    fn shutdown_joins_all_workers() {
        let mut loader = FileLoader::new();
        loader.request_load(PathBuf::from("/tmp/whatever.xml"));
        loader.shutdown();
        assert!(loader.workers.is_empty());
    }
}

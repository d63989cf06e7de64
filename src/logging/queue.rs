//! Single-consumer write queue
//!
//! Every mutation of the log files is a [`Job`] sent over an unbounded
//! channel to one dedicated worker thread, which owns the [`LogStore`] and
//! runs jobs strictly in arrival order. Submitting never blocks on I/O.
//!
//! Shutdown closes the channel and joins the worker after it has drained
//! everything already queued.

use std::io;
use std::sync::{Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};

use super::console::SharedConsole;
use super::error::{LogError, LogResult};
use super::store::LogStore;

const WORKER_THREAD_NAME: &str = "yamlog-writer";

/// A unit of work for the writer thread
#[derive(Debug)]
pub enum Job {
    /// Append one rendered entry, rotating first if a threshold was crossed
    Append(String),
    /// Delete and recreate the active file with a fresh header
    Clear,
    /// Barrier: acknowledged once every earlier job has run
    Flush(oneshot::Sender<()>),
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Append(_) => "append",
            Job::Clear => "clear",
            Job::Flush(_) => "flush",
        }
    }
}

/// Handle to the writer thread
pub struct WriteQueue {
    sender: RwLock<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WriteQueue {
    /// Spawn the writer thread, handing it ownership of `store`
    pub fn start(store: LogStore, console: SharedConsole) -> io::Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(store, receiver, console))?;

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Enqueue a job; fails only once the queue has been shut down
    pub fn submit(&self, job: Job) -> LogResult<()> {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(tx) => tx.send(job).map_err(|_| LogError::QueueClosed),
            None => Err(LogError::QueueClosed),
        }
    }

    pub fn append(&self, text: String) -> LogResult<()> {
        self.submit(Job::Append(text))
    }

    pub fn clear(&self) -> LogResult<()> {
        self.submit(Job::Clear)
    }

    /// Block until every job submitted before this call has run.
    ///
    /// Returns `false` without waiting when the queue is shut down or when
    /// called from any thread with a tokio runtime context (use
    /// [`flush_async`](Self::flush_async) there). That includes
    /// `spawn_blocking` threads, which inherit the context; wrap the call in a
    /// plain `std::thread` if a blocking barrier is needed there.
    pub fn flush(&self) -> bool {
        if tokio::runtime::Handle::try_current().is_ok() {
            tracing::debug!("Blocking flush requested inside an async runtime, skipping");
            return false;
        }

        let (ack, done) = oneshot::channel();
        if self.submit(Job::Flush(ack)).is_err() {
            return false;
        }
        done.blocking_recv().is_ok()
    }

    /// Async counterpart of [`flush`](Self::flush)
    pub async fn flush_async(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.submit(Job::Flush(ack)).is_err() {
            return false;
        }
        done.await.is_ok()
    }

    /// Whether jobs are still being accepted
    pub fn is_running(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop accepting jobs, drain the queue, and join the worker.
    ///
    /// Safe to call repeatedly or concurrently; every caller returns only
    /// after the drain has finished.
    pub fn shutdown(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        // Dropping the last sender lets the worker's receive loop end after the backlog
        self.sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::error!("Log writer thread panicked during shutdown");
            }
        }
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    mut store: LogStore,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    console: SharedConsole,
) {
    tracing::debug!(path = %store.paths().active.display(), "Log writer started");

    while let Some(job) = receiver.blocking_recv() {
        let name = job.name();
        let result = match job {
            Job::Append(text) => append_with_rotation(&mut store, &text, &console),
            Job::Clear => store.clear(),
            Job::Flush(ack) => {
                // The flusher may have given up waiting
                let _ = ack.send(());
                Ok(())
            }
        };

        if let Err(e) = result {
            console.report_error(name, &e);
        }
    }

    tracing::debug!(path = %store.paths().active.display(), "Log writer drained and stopped");
}

fn append_with_rotation(
    store: &mut LogStore,
    text: &str,
    console: &SharedConsole,
) -> LogResult<()> {
    store.refresh_size();
    if store.should_rotate() {
        // A failed rotation leaves the active file in place; the entry still goes there
        if let Err(e) = store.rotate() {
            console.report_error("rotate", &e);
        }
    }
    store.append_entry(text)
}

//! Background render worker.
//!
//! One dedicated thread draining CPU tasks from an unbounded channel:
//! asset post-processing, CPU-side mesh work, anything that must not
//! stall the frame loop. Not part of the per-frame critical path.
//!
//! The worker is an explicit object owned by the application assembly,
//! not a process-wide static; dropping it shuts the thread down and joins
//! it.

use crossbeam_channel::{unbounded, Sender};
use std::thread::JoinHandle;

use crate::error::{Error, Result};
use crate::log::Log;
use crate::engine_warn;

/// A unit of offloaded CPU work
type WorkerTask = Box<dyn FnOnce() + Send + 'static>;

enum WorkerMessage {
    Task(WorkerTask),
    Shutdown,
}

/// Dedicated background thread fed by a lock-free task queue
pub struct RenderWorker {
    sender: Sender<WorkerMessage>,
    thread: Option<JoinHandle<()>>,
    log: Log,
}

impl RenderWorker {
    /// Spawn the worker thread
    pub fn new(log: Log) -> Result<Self> {
        let (sender, receiver) = unbounded::<WorkerMessage>();

        let thread = std::thread::Builder::new()
            .name("quasar3d-render-worker".to_string())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        WorkerMessage::Task(task) => task(),
                        WorkerMessage::Shutdown => break,
                    }
                }
            })
            .map_err(|e| {
                Error::InitializationFailed(format!("Failed to spawn render worker thread: {}", e))
            })?;

        Ok(Self {
            sender,
            thread: Some(thread),
            log,
        })
    }

    /// Enqueue a task for the worker thread
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(WorkerMessage::Task(Box::new(task)))
            .map_err(|_| Error::BackendError("Render worker thread is not running".to_string()))
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        // Queued tasks drain before the shutdown message is reached
        if self.sender.send(WorkerMessage::Shutdown).is_err() {
            engine_warn!(
                self.log,
                "quasar3d::RenderWorker",
                "Worker thread ended before shutdown was requested"
            );
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                engine_warn!(
                    self.log,
                    "quasar3d::RenderWorker",
                    "Worker thread panicked during shutdown"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

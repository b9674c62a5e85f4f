//! Continuations onto the host main thread.
//!
//! Console hosts typically allow replies only from their main thread. Work
//! finished on the worker pool is handed back through a [`MainThread`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Work to run on the main thread.
pub type Task = Box<dyn FnOnce() + Send>;

/// Schedules work onto the host main thread.
pub trait MainThread: Send + Sync {
    fn schedule(&self, task: Task);
}

/// Queue drained by the host on its own tick.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Task>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Task>>>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Run every queued task on the calling thread. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut receiver = self.receiver.lock();
        let mut ran = 0;
        while let Ok(task) = receiver.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            debug!(tasks = ran, "Ran main thread tasks");
        }
        ran
    }
}

impl MainThread for TaskQueue {
    fn schedule(&self, task: Task) {
        // The receiver lives as long as any clone of the queue, so this only
        // fails while the queue itself is being dropped.
        let _ = self.sender.send(task);
    }
}

/// Runs tasks on whichever thread schedules them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl MainThread for Immediate {
    fn schedule(&self, task: Task) {
        task();
    }
}

//! Execution providers and deferred outcomes.
//!
//! The synchronous provider runs a handler on the dispatching thread. The
//! asynchronous provider hands it to a bounded pool of blocking workers on a
//! tokio runtime owned by the adapter. Both report through [`PendingOutcome`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use anyhow::anyhow;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::warn;

use crate::invocation::Invocation;
use crate::message::{MessageContext, MessageKey};
use crate::outcome::Outcome;

/// Strategy for running a resolved invocation.
#[derive(Debug, Clone)]
pub enum ExecutionProvider {
    /// Run immediately on the calling thread.
    Sync,
    /// Run on a worker pool.
    Async(WorkerPool),
}

impl ExecutionProvider {
    /// Submit an invocation. Handler errors never escape; they complete the
    /// returned outcome as `ExecutionFailed`.
    pub fn submit<S: Send + 'static>(&self, invocation: Invocation<S>) -> PendingOutcome {
        match self {
            Self::Sync => PendingOutcome::ready(invocation.run()),
            Self::Async(pool) => pool.submit(invocation),
        }
    }

    /// Whether work runs on a worker pool.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

/// Blocking workers on a tokio runtime, bounded by a semaphore.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool running at most `size` handlers at once (at least one).
    pub fn new(handle: Handle, size: usize) -> Self {
        let size = size.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Pool on the runtime of the current context, if there is one.
    pub fn try_current(size: usize) -> Option<Self> {
        Handle::try_current().ok().map(|handle| Self::new(handle, size))
    }

    /// Maximum number of handlers running at once.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held by a running handler.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    fn submit<S: Send + 'static>(&self, invocation: Invocation<S>) -> PendingOutcome {
        let context = invocation.context.clone();
        let task_context = context.clone();
        let permits = Arc::clone(&self.permits);
        let handle = self.handle.clone();

        let task = self.handle.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return Outcome::failed(
                        MessageKey::EXECUTION_FAILED,
                        task_context.with_error(anyhow!("Worker pool closed: {}", e)),
                    );
                }
            };
            match handle.spawn_blocking(move || invocation.run()).await {
                Ok(outcome) => outcome,
                Err(e) => join_failure(task_context, e),
            }
        });

        PendingOutcome {
            state: State::Running { task, context },
        }
    }
}

fn join_failure(context: MessageContext, error: JoinError) -> Outcome {
    warn!(command = %context.command, error = %error, "Command worker did not complete");
    let error = if error.is_panic() {
        anyhow!("handler panicked on worker: {}", error)
    } else {
        anyhow!("handler cancelled: {}", error)
    };
    Outcome::failed(MessageKey::EXECUTION_FAILED, context.with_error(error))
}

/// Deferred result of a dispatch.
///
/// Resolves immediately for failures detected before execution and for
/// synchronous handlers; otherwise when the worker finishes. Dropping it does
/// not cancel the handler.
#[derive(Debug)]
pub struct PendingOutcome {
    state: State,
}

#[derive(Debug)]
enum State {
    Ready(Option<Outcome>),
    Running {
        task: JoinHandle<Outcome>,
        context: MessageContext,
    },
}

impl PendingOutcome {
    /// An already completed outcome.
    pub fn ready(outcome: Outcome) -> Self {
        Self {
            state: State::Ready(Some(outcome)),
        }
    }

    /// Whether the outcome is available without waiting.
    pub fn is_ready(&self) -> bool {
        match &self.state {
            State::Ready(outcome) => outcome.is_some(),
            State::Running { task, .. } => task.is_finished(),
        }
    }

    /// Take the outcome if it was produced synchronously.
    pub fn into_ready(self) -> Result<Outcome, Self> {
        match self.state {
            State::Ready(Some(outcome)) => Ok(outcome),
            state => Err(Self { state }),
        }
    }
}

impl Future for PendingOutcome {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        match &mut self.get_mut().state {
            State::Ready(outcome) => {
                Poll::Ready(outcome.take().expect("PendingOutcome polled after completion"))
            }
            State::Running { task, context } => match Pin::new(task).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(e)) => Poll::Ready(join_failure(context.clone(), e)),
            },
        }
    }
}

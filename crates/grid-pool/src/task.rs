//! Task closures, worker-side context, and completion handles.

use std::time::Duration;

use tokio::sync::oneshot;

use grid_types::{GridError, HostName, Namespace, Value, WorkerId};

// ── Worker context ────────────────────────────────────────────────────────────

/// Execution context handed to every task closure on its target worker.
///
/// `id` is the executing worker's own identity — per-target customization
/// ("my id doubled") reads it from here instead of shipping code or
/// relying on ambient state.
pub struct WorkerCtx {
    pub id: WorkerId,
    pub host: HostName,
    pub ns: Namespace,
}

/// A remote operation: runs on the target worker against its context.
/// Captures are explicit; nothing is serialized or evaluated as code.
pub type Task = Box<dyn FnOnce(&mut WorkerCtx) -> Result<Value, GridError> + Send>;

/// Box a closure into a [`Task`].
pub fn task<F>(f: F) -> Task
where
    F: FnOnce(&mut WorkerCtx) -> Result<Value, GridError> + Send + 'static,
{
    Box::new(f)
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Commands sent from the [`crate::WorkerPool`] handle into a worker's
/// command loop.
pub(crate) enum WorkerCommand {
    /// Run a task and reply with its result.
    Execute {
        task: Task,
        reply: oneshot::Sender<Result<Value, GridError>>,
    },
    /// Exit the command loop cleanly.
    Shutdown,
}

// ── TaskHandle ────────────────────────────────────────────────────────────────

/// Future for one submitted task.
///
/// Submission never blocks; every failure mode, including a submission
/// that could not be made at all, surfaces when the handle is joined.
pub struct TaskHandle {
    worker: WorkerId,
    timeout: Option<Duration>,
    state: HandleState,
}

enum HandleState {
    Pending(oneshot::Receiver<Result<Value, GridError>>),
    /// Submission already failed (unknown or stopped worker).
    Failed(GridError),
}

impl TaskHandle {
    pub(crate) fn pending(
        worker: WorkerId,
        timeout: Option<Duration>,
        rx: oneshot::Receiver<Result<Value, GridError>>,
    ) -> Self {
        Self {
            worker,
            timeout,
            state: HandleState::Pending(rx),
        }
    }

    pub(crate) fn failed(worker: WorkerId, reason: GridError) -> Self {
        Self {
            worker,
            timeout: None,
            state: HandleState::Failed(reason),
        }
    }

    /// The worker this task was submitted to.
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Wait for the task's result.
    ///
    /// An elapsed pool timeout resolves to [`GridError::Timeout`]; a
    /// worker that died before replying resolves to
    /// [`GridError::Unreachable`].
    pub async fn join(self) -> Result<Value, GridError> {
        let worker = self.worker;
        match self.state {
            HandleState::Failed(reason) => Err(reason),
            HandleState::Pending(rx) => {
                let wait = async move {
                    match rx.await {
                        Ok(result) => result,
                        Err(_) => Err(GridError::Unreachable(worker)),
                    }
                };
                match self.timeout {
                    Some(limit) => match tokio::time::timeout(limit, wait).await {
                        Ok(result) => result,
                        Err(_elapsed) => Err(GridError::Timeout(worker)),
                    },
                    None => wait.await,
                }
            }
        }
    }
}

/// Explicit fan-in barrier: wait for every handle, preserving the pairing
/// between worker and outcome. All submissions made before this call
/// happen-before its return.
pub async fn join_all(handles: Vec<TaskHandle>) -> Vec<(WorkerId, Result<Value, GridError>)> {
    let workers: Vec<WorkerId> = handles.iter().map(TaskHandle::worker).collect();
    let results =
        futures::future::join_all(handles.into_iter().map(TaskHandle::join)).await;
    workers.into_iter().zip(results).collect()
}

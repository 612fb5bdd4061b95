//! In-process Remote Execution Primitive.
//!
//! One background tokio task per worker, addressed only through a command
//! channel; no memory is shared between the controller and a worker, or
//! between workers. The [`WorkerPool`] handle submits [`Task`] closures
//! and hands back [`TaskHandle`] futures; fan-outs scatter submissions
//! back-to-back and gather them with one explicit [`join_all`].
//!
//! # Example
//! ```rust,no_run
//! use grid_pool::{task, WorkerPool};
//! use grid_types::{PoolConfig, Value, WorkerId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), grid_types::GridError> {
//!     let pool = WorkerPool::spawn(PoolConfig::local(4))?;
//!     let doubled = pool
//!         .call(WorkerId(2), task(|ctx| Ok(Value::Int(ctx.id.0 as i64 * 2))))
//!         .await?;
//!     assert_eq!(doubled, Value::Int(4));
//!     Ok(())
//! }
//! ```

pub mod task;
mod worker;

pub use task::{join_all, task, Task, TaskHandle, WorkerCtx};

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use grid_types::error::Result;
use grid_types::{GridError, HostName, PoolConfig, Value, WorkerId};

use crate::task::WorkerCommand;
use crate::worker::WorkerRunner;

// ── WorkerPool ────────────────────────────────────────────────────────────────

/// Controlling handle over the pool of worker tasks.
///
/// Owns one command sender per worker; the workers themselves run
/// concurrently in background tokio tasks spawned by [`WorkerPool::spawn`].
pub struct WorkerPool {
    senders: BTreeMap<WorkerId, mpsc::Sender<WorkerCommand>>,
    op_timeout: Option<Duration>,
    controller_host: HostName,
}

impl WorkerPool {
    /// Spawn one background task per configured worker and return the
    /// handle. Returns immediately — workers run concurrently.
    ///
    /// Rejects an empty worker list, a zero id, and duplicate ids.
    pub fn spawn(config: PoolConfig) -> Result<Self> {
        if config.workers.is_empty() {
            return Err(GridError::InvalidArgument(
                "pool needs at least one worker".into(),
            ));
        }

        let mut senders = BTreeMap::new();
        for spec in &config.workers {
            if spec.id.0 == 0 {
                return Err(GridError::InvalidArgument(
                    "worker ids must be positive".into(),
                ));
            }
            if senders.contains_key(&spec.id) {
                return Err(GridError::InvalidArgument(format!(
                    "duplicate worker id {}",
                    spec.id
                )));
            }

            let (tx, rx) = mpsc::channel(config.channel_capacity);
            tokio::spawn(WorkerRunner::new(spec, rx).run());
            senders.insert(spec.id, tx);
        }

        info!(workers = senders.len(), "worker pool spawned");
        Ok(Self {
            senders,
            op_timeout: config.op_timeout,
            controller_host: config.controller_host,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    /// Worker ids in ascending order — the pool's iteration order.
    pub fn workers(&self) -> Vec<WorkerId> {
        self.senders.keys().copied().collect()
    }

    pub fn controller_host(&self) -> &str {
        &self.controller_host
    }

    pub fn op_timeout(&self) -> Option<Duration> {
        self.op_timeout
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Submit a task to one worker. Never blocks; a task that could not
    /// be submitted yields a handle that joins to
    /// [`GridError::Unreachable`].
    pub fn submit(&self, worker: WorkerId, task: Task) -> TaskHandle {
        let Some(tx) = self.senders.get(&worker) else {
            return TaskHandle::failed(worker, GridError::Unreachable(worker));
        };

        let (reply, rx) = oneshot::channel();
        match tx.try_send(WorkerCommand::Execute { task, reply }) {
            Ok(()) => TaskHandle::pending(worker, self.op_timeout, rx),
            Err(_) => TaskHandle::failed(worker, GridError::Unreachable(worker)),
        }
    }

    /// Submit one task per worker, constructed by `make` with the
    /// target's identity. Submissions are issued back-to-back; pair the
    /// result with [`join_all`] for the fan-in barrier.
    pub fn submit_many<F>(&self, workers: &[WorkerId], make: F) -> Vec<TaskHandle>
    where
        F: Fn(WorkerId) -> Task,
    {
        workers.iter().map(|&w| self.submit(w, make(w))).collect()
    }

    /// Submit and wait — the blocking-call form.
    pub async fn call(&self, worker: WorkerId, task: Task) -> Result<Value> {
        self.submit(worker, task).join().await
    }

    /// Remote host-identity query: asks the worker itself.
    pub async fn host_identity(&self, worker: WorkerId) -> Result<HostName> {
        let value = self
            .call(worker, task(|ctx| Ok(Value::Text(ctx.host.clone()))))
            .await?;
        match value {
            Value::Text(host) => Ok(host),
            other => Err(GridError::Task {
                worker,
                reason: format!("host query returned {}", other.type_name()),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Stop a single worker. Subsequent submissions to it resolve to
    /// [`GridError::Unreachable`]. Returns whether the worker existed.
    pub async fn stop(&mut self, worker: WorkerId) -> bool {
        match self.senders.remove(&worker) {
            Some(tx) => {
                let _ = tx.send(WorkerCommand::Shutdown).await;
                true
            }
            None => false,
        }
    }

    /// Signal every worker loop to shut down gracefully.
    pub async fn shutdown(&mut self) {
        for (worker, tx) in std::mem::take(&mut self.senders) {
            if tx.send(WorkerCommand::Shutdown).await.is_err() {
                debug!(%worker, "worker already stopped");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

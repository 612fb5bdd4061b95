//! Per-worker command loop.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use grid_types::{Namespace, WorkerSpec};

use crate::task::{WorkerCommand, WorkerCtx};

/// Owns one worker's context and drains its command channel.
/// Constructed by [`crate::WorkerPool::spawn`] and consumed by
/// [`WorkerRunner::run`].
pub(crate) struct WorkerRunner {
    ctx: WorkerCtx,
    rx: mpsc::Receiver<WorkerCommand>,
}

impl WorkerRunner {
    pub(crate) fn new(spec: &WorkerSpec, rx: mpsc::Receiver<WorkerCommand>) -> Self {
        Self {
            ctx: WorkerCtx {
                id: spec.id,
                host: spec.host.clone(),
                ns: Namespace::new(),
            },
            rx,
        }
    }

    /// Sequential command loop.
    ///
    /// Tasks run strictly in arrival order — a worker is addressed, never
    /// scheduled, so its namespace needs no lock and its own-entry writes
    /// serialize naturally.
    pub(crate) async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                WorkerCommand::Execute { task, reply } => {
                    let result = task(&mut self.ctx);
                    if let Err(ref e) = result {
                        debug!(worker = %self.ctx.id, %e, "task returned an error");
                    }
                    if reply.send(result).is_err() {
                        warn!(worker = %self.ctx.id, "reply receiver dropped before completion");
                    }
                }
                WorkerCommand::Shutdown => {
                    debug!(worker = %self.ctx.id, "worker loop shutting down");
                    return;
                }
            }
        }
        debug!(worker = %self.ctx.id, "command channel closed");
    }
}

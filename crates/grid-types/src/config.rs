// Pool construction settings.

use std::time::Duration;

use crate::id::{HostName, WorkerId};

/// Identity and placement of one worker in the pool.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub id: WorkerId,
    /// Host identity the worker reports to `host_identity` queries.
    pub host: HostName,
}

impl WorkerSpec {
    pub fn new(id: u32, host: &str) -> Self {
        Self {
            id: WorkerId(id),
            host: host.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: Vec<WorkerSpec>,

    /// Per-operation wait limit applied at every join.
    /// `None` = wait indefinitely. Default: 30 seconds.
    pub op_timeout: Option<Duration>,

    /// Command-channel depth per worker. A swap queues at most two
    /// commands per participant on each worker, so 256 slots absorbs a
    /// full exchange fan-out for pools of up to 128 workers without
    /// rejecting submissions.
    pub channel_capacity: usize,

    /// The controller's own host identity, used by host filters.
    /// Defaults to `$HOSTNAME`, falling back to `"localhost"`.
    pub controller_host: HostName,
}

impl PoolConfig {
    /// `n` workers with ids `1..=n`, all on the controller's host.
    pub fn local(n: u32) -> Self {
        let controller_host = default_controller_host();
        let workers = (1..=n)
            .map(|id| WorkerSpec {
                id: WorkerId(id),
                host: controller_host.clone(),
            })
            .collect();
        Self {
            workers,
            controller_host,
            ..Self::default()
        }
    }

    pub fn with_workers(workers: Vec<WorkerSpec>) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: Vec::new(),
            op_timeout: Some(Duration::from_secs(30)),
            channel_capacity: 256,
            controller_host: default_controller_host(),
        }
    }
}

fn default_controller_host() -> HostName {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = PoolConfig::default();
        assert!(cfg.workers.is_empty());
        assert_eq!(cfg.op_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.channel_capacity, 256);
        assert!(!cfg.controller_host.is_empty());
    }

    #[test]
    fn local_pool_shares_controller_host() {
        let cfg = PoolConfig::local(3);
        assert_eq!(cfg.workers.len(), 3);
        assert_eq!(cfg.workers[0].id, WorkerId(1));
        assert!(cfg.workers.iter().all(|w| w.host == cfg.controller_host));
    }
}

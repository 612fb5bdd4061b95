//! Namespace broadcast: install values on workers (sow) and read them
//! back (reap).
//!
//! A sow mutates only the target workers' namespaces; the controller's
//! own state is untouched. Reads follow the omit-and-report policy: a
//! target without the binding is left out of the result and listed as a
//! failure, never papered over with a default.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use grid_pool::{join_all, task, TaskHandle, WorkerPool};
use grid_types::error::Result;
use grid_types::{GridError, Value, WorkerId};

use crate::outcome::{self, Failure, Partial};

// ── Seed ──────────────────────────────────────────────────────────────────────

/// Payload for a broadcast: one concrete value for every target, or a
/// per-worker constructor evaluated with each target's own identity
/// ("1000 minus my id") — explicit captures, no code shipped as data.
#[derive(Clone)]
pub enum Seed {
    Value(Value),
    PerWorker(Arc<dyn Fn(WorkerId) -> Value + Send + Sync>),
}

impl Seed {
    pub fn value(v: impl Into<Value>) -> Self {
        Self::Value(v.into())
    }

    pub fn per_worker<F>(f: F) -> Self
    where
        F: Fn(WorkerId) -> Value + Send + Sync + 'static,
    {
        Self::PerWorker(Arc::new(f))
    }

    /// The value worker `id` receives.
    fn materialize(&self, id: WorkerId) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::PerWorker(f) => f(id),
        }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::PerWorker(_) => f.write_str("PerWorker(..)"),
        }
    }
}

// ── Sow ───────────────────────────────────────────────────────────────────────

/// Bind `name` on every target concurrently.
///
/// Returns one handle per target without waiting; callers needing the
/// barrier join the handles or use [`sow_all`]. Rebinding overwrites:
/// last writer wins.
pub fn sow(
    pool: &WorkerPool,
    targets: &[WorkerId],
    name: &str,
    seed: &Seed,
) -> Vec<TaskHandle> {
    debug!(%name, targets = targets.len(), "sowing binding");
    targets
        .iter()
        .map(|&worker| {
            let value = seed.materialize(worker);
            let name = name.to_string();
            pool.submit(
                worker,
                task(move |ctx| {
                    ctx.ns.bind(name, value);
                    Ok(Value::Unit)
                }),
            )
        })
        .collect()
}

/// [`sow`] plus the explicit fan-in barrier.
pub async fn sow_all(
    pool: &WorkerPool,
    targets: &[WorkerId],
    name: &str,
    seed: &Seed,
) -> Result<Partial<()>> {
    let failures = gather_effects(sow(pool, targets, name, seed)).await;
    if outcome::total_failure(&failures, targets.len()) {
        return Err(GridError::PoolUnavailable(format!(
            "sow '{name}': no target reachable"
        )));
    }
    Ok(Partial::new((), failures))
}

/// Remove the binding from every target — the message-dictionary
/// destruction path: a copy dies with its binding. Clearing an absent
/// name is not an error.
pub async fn clear(pool: &WorkerPool, targets: &[WorkerId], name: &str) -> Result<Partial<()>> {
    let handles: Vec<TaskHandle> = targets
        .iter()
        .map(|&worker| {
            let name = name.to_string();
            pool.submit(
                worker,
                task(move |ctx| {
                    ctx.ns.clear(&name);
                    Ok(Value::Unit)
                }),
            )
        })
        .collect();

    let failures = gather_effects(handles).await;
    if outcome::total_failure(&failures, targets.len()) {
        return Err(GridError::PoolUnavailable(format!(
            "clear '{name}': no target reachable"
        )));
    }
    Ok(Partial::new((), failures))
}

/// Join effect-only handles, keeping the failed pairs.
async fn gather_effects(handles: Vec<TaskHandle>) -> Vec<Failure> {
    join_all(handles)
        .await
        .into_iter()
        .filter_map(|(worker, result)| {
            result.err().map(|reason| Failure {
                source: worker,
                target: None,
                reason,
            })
        })
        .collect()
}

// ── Reap ──────────────────────────────────────────────────────────────────────

/// Read `name` from every target concurrently; block until all reads
/// resolve or fail.
///
/// Targets without the binding are omitted from the mapping and reported
/// as [`GridError::UnboundName`] failures.
pub async fn reap(
    pool: &WorkerPool,
    targets: &[WorkerId],
    name: &str,
) -> Result<Partial<BTreeMap<WorkerId, Value>>> {
    let handles: Vec<TaskHandle> = targets
        .iter()
        .map(|&worker| {
            let name = name.to_string();
            pool.submit(
                worker,
                task(move |ctx| match ctx.ns.read(&name) {
                    Some(v) => Ok(v.clone()),
                    None => Err(GridError::UnboundName {
                        worker: ctx.id,
                        name,
                    }),
                }),
            )
        })
        .collect();

    let mut values = BTreeMap::new();
    let mut failures = Vec::new();
    for (worker, result) in join_all(handles).await {
        match result {
            Ok(v) => {
                values.insert(worker, v);
            }
            Err(reason) => {
                warn!(%worker, %name, %reason, "reap read failed");
                failures.push(Failure {
                    source: worker,
                    target: None,
                    reason,
                });
            }
        }
    }

    if values.is_empty() && outcome::total_failure(&failures, targets.len()) {
        return Err(GridError::PoolUnavailable(format!(
            "reap '{name}': no target reachable"
        )));
    }
    Ok(Partial::new(values, failures))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use grid_types::PoolConfig;

    fn ids(raw: &[u32]) -> Vec<WorkerId> {
        raw.iter().copied().map(WorkerId).collect()
    }

    #[tokio::test]
    async fn sow_then_reap_read_after_write() {
        let pool = WorkerPool::spawn(PoolConfig::local(3)).unwrap();
        let targets = pool.workers();

        sow_all(&pool, &targets, "greeting", &Seed::value("hello"))
            .await
            .unwrap();

        let outcome = reap(&pool, &targets, "greeting").await.unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.value.len(), 3);
        for value in outcome.value.values() {
            assert_eq!(value, &Value::Text("hello".into()));
        }
    }

    #[tokio::test]
    async fn rebind_observes_last_writer() {
        let pool = WorkerPool::spawn(PoolConfig::local(1)).unwrap();
        let targets = pool.workers();

        sow_all(&pool, &targets, "x", &Seed::value(1)).await.unwrap();
        sow_all(&pool, &targets, "x", &Seed::value(2)).await.unwrap();

        let outcome = reap(&pool, &targets, "x").await.unwrap();
        assert_eq!(outcome.value[&WorkerId(1)], Value::Int(2));
    }

    #[tokio::test]
    async fn per_worker_seed_captures_each_identity() {
        let pool = WorkerPool::spawn(PoolConfig::local(3)).unwrap();
        let targets = pool.workers();

        let seed = Seed::per_worker(|id| Value::Int(1000 - id.0 as i64));
        sow_all(&pool, &targets, "slot", &seed).await.unwrap();

        let outcome = reap(&pool, &targets, "slot").await.unwrap();
        for (worker, value) in &outcome.value {
            assert_eq!(value, &Value::Int(1000 - worker.0 as i64));
        }
    }

    #[tokio::test]
    async fn reap_omits_and_reports_missing_bindings() {
        let pool = WorkerPool::spawn(PoolConfig::local(3)).unwrap();

        sow_all(&pool, &ids(&[1, 2]), "partial", &Seed::value(5))
            .await
            .unwrap();

        let outcome = reap(&pool, &ids(&[1, 2, 3]), "partial").await.unwrap();
        assert_eq!(outcome.value.len(), 2);
        assert!(!outcome.value.contains_key(&WorkerId(3)));
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0].reason,
            GridError::UnboundName { worker: WorkerId(3), .. }
        ));
    }

    #[tokio::test]
    async fn clear_unbinds_everywhere() {
        let pool = WorkerPool::spawn(PoolConfig::local(2)).unwrap();
        let targets = pool.workers();

        sow_all(&pool, &targets, "temp", &Seed::value(9)).await.unwrap();
        clear(&pool, &targets, "temp").await.unwrap();

        let outcome = reap(&pool, &targets, "temp").await.unwrap();
        assert!(outcome.value.is_empty());
        assert_eq!(outcome.failures.len(), 2);
    }

    #[tokio::test]
    async fn sow_does_not_wait_without_barrier() {
        let pool = WorkerPool::spawn(PoolConfig::local(2)).unwrap();
        let targets = pool.workers();

        // Handles are returned immediately; the explicit join is the barrier.
        let handles = sow(&pool, &targets, "lazy", &Seed::value(1));
        assert_eq!(handles.len(), 2);
        for (_, result) in join_all(handles).await {
            result.unwrap();
        }

        let outcome = reap(&pool, &targets, "lazy").await.unwrap();
        assert_eq!(outcome.value.len(), 2);
    }
}

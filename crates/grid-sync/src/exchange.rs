//! The exchange protocol: all-to-all `swap` and many-to-one `collect`.
//!
//! Message-dictionary copies converge only here. A swap costs O(P²)
//! point-to-point fetches for P participants — the dominant cost of the
//! whole layer and the reason [`crate::mean_duration`] exists. A collect
//! costs O(P).
//!
//! Neither operation is atomic: a fetched entry reflects its owner's
//! value at the time of that fetch, so local mutation concurrent with an
//! exchange may be observed by some participants and not others
//! (eventual pairwise consistency, not a snapshot).

use tracing::{info, warn};
use uuid::Uuid;

use grid_pool::{join_all, task, Task, WorkerPool};
use grid_types::error::Result;
use grid_types::{GridError, MessageDict, Value, WorkerId};

use crate::outcome::{self, Failure, Partial};

// ── Fetch/write primitives ────────────────────────────────────────────────────

/// Task reading the executing worker's own entry of the named dictionary.
fn fetch_own_entry(name: String) -> Task {
    task(move |ctx| {
        let worker = ctx.id;
        match ctx.ns.read(&name) {
            None => Err(GridError::UnboundName { worker, name }),
            Some(value) => match value.as_dict() {
                None => Err(GridError::NotADict {
                    worker,
                    found: value.type_name(),
                    name,
                }),
                Some(dict) => match dict.get(worker) {
                    Some(entry) => Ok(entry.clone()),
                    None => Err(GridError::MissingEntry {
                        worker,
                        name,
                        entry: worker,
                    }),
                },
            },
        }
    })
}

/// Task overwriting entry `entry` of the named dictionary with `value`.
fn write_entry(name: String, entry: WorkerId, value: Value) -> Task {
    task(move |ctx| {
        let worker = ctx.id;
        match ctx.ns.read_mut(&name) {
            None => Err(GridError::UnboundName { worker, name }),
            Some(slot) => {
                let found = slot.type_name();
                match slot.as_dict_mut() {
                    None => Err(GridError::NotADict { worker, name, found }),
                    Some(dict) => {
                        dict.set(entry, value);
                        Ok(Value::Unit)
                    }
                }
            }
        }
    })
}

// ── Swap ──────────────────────────────────────────────────────────────────────

/// All-to-all refresh of the named dictionary across `participants`.
///
/// For every ordered pair `(p, j)` — including `p == j` — fetch `j`'s
/// own entry from `j`'s copy, then overwrite entry `j` in `p`'s copy.
/// All pair refreshes run concurrently and the call returns only after
/// the explicit join of every one of them. A failed pair leaves `p`'s
/// entry for `j` untouched and never aborts its siblings; each failed
/// pair is reported as `(source: j, target: p)`.
pub async fn swap(
    pool: &WorkerPool,
    participants: &[WorkerId],
    name: &str,
) -> Result<Partial<()>> {
    if participants.is_empty() {
        return Err(GridError::InvalidArgument(
            "swap: empty participant set".into(),
        ));
    }

    let op = Uuid::new_v4();
    info!(%op, %name, participants = participants.len(), "swap started");

    let mut refreshes = Vec::with_capacity(participants.len() * participants.len());
    for &p in participants {
        for &j in participants {
            let name = name.to_string();
            refreshes.push(async move {
                let outcome = match pool.submit(j, fetch_own_entry(name.clone())).join().await
                {
                    Ok(value) => pool
                        .submit(p, write_entry(name, j, value))
                        .join()
                        .await
                        .map(|_| ()),
                    Err(e) => Err(e),
                };
                (p, j, outcome)
            });
        }
    }

    let mut failures = Vec::new();
    for (p, j, outcome) in futures::future::join_all(refreshes).await {
        if let Err(reason) = outcome {
            warn!(%op, source = %j, target = %p, %reason, "swap pair failed");
            failures.push(Failure {
                source: j,
                target: Some(p),
                reason,
            });
        }
    }

    let attempted = participants.len() * participants.len();
    if outcome::total_failure(&failures, attempted) {
        return Err(GridError::PoolUnavailable(
            "swap: no participant reachable".into(),
        ));
    }

    info!(%op, failed = failures.len(), "swap finished");
    Ok(Partial::new((), failures))
}

// ── Collect ───────────────────────────────────────────────────────────────────

/// Many-to-one reduction: fetch every source worker's own entry into a
/// fresh mapping held by the controller.
///
/// Entries come straight from each owner's copy; no swap is needed
/// first. Full success yields exactly `source.len()` entries; failed
/// fetches are omitted and reported.
pub async fn collect(
    pool: &WorkerPool,
    name: &str,
    source: &[WorkerId],
) -> Result<Partial<MessageDict>> {
    if source.is_empty() {
        return Err(GridError::InvalidArgument(
            "collect: empty source set".into(),
        ));
    }

    let op = Uuid::new_v4();
    info!(%op, %name, sources = source.len(), "collect started");

    let handles: Vec<_> = source
        .iter()
        .map(|&j| pool.submit(j, fetch_own_entry(name.to_string())))
        .collect();

    let mut dict = MessageDict::new();
    let mut failures = Vec::new();
    for (j, result) in join_all(handles).await {
        match result {
            Ok(value) => dict.set(j, value),
            Err(reason) => {
                warn!(%op, source = %j, %reason, "collect fetch failed");
                failures.push(Failure {
                    source: j,
                    target: None,
                    reason,
                });
            }
        }
    }

    if outcome::total_failure(&failures, source.len()) {
        return Err(GridError::PoolUnavailable(
            "collect: no source reachable".into(),
        ));
    }

    info!(%op, entries = dict.len(), failed = failures.len(), "collect finished");
    Ok(Partial::new(dict, failures))
}

/// Like [`collect`], but folds the fetched entries into worker `into`'s
/// copy and returns the folded mapping — which keeps any extra entries
/// that worker already held.
///
/// Fails outright if `into`'s copy cannot be read back afterwards.
pub async fn collect_into(
    pool: &WorkerPool,
    name: &str,
    source: &[WorkerId],
    into: WorkerId,
) -> Result<Partial<MessageDict>> {
    let gathered = collect(pool, name, source).await?;
    let mut failures = gathered.failures;

    // Fold each fetched entry into `into`'s copy: scatter the writes,
    // then gather.
    let entries: Vec<(WorkerId, Value)> = gathered
        .value
        .iter()
        .map(|(j, v)| (j, v.clone()))
        .collect();
    let writes: Vec<_> = entries
        .into_iter()
        .map(|(j, value)| {
            (
                j,
                pool.submit(into, write_entry(name.to_string(), j, value)),
            )
        })
        .collect();

    for (j, handle) in writes {
        if let Err(reason) = handle.join().await {
            warn!(source = %j, target = %into, %reason, "collect fold failed");
            failures.push(Failure {
                source: j,
                target: Some(into),
                reason,
            });
        }
    }

    let folded = pool
        .call(into, task({
            let name = name.to_string();
            move |ctx| match ctx.ns.read(&name) {
                Some(v) => Ok(v.clone()),
                None => Err(GridError::UnboundName {
                    worker: ctx.id,
                    name,
                }),
            }
        }))
        .await?;

    match folded {
        Value::Dict(dict) => Ok(Partial::new(dict, failures)),
        other => Err(GridError::NotADict {
            worker: into,
            name: name.to_string(),
            found: other.type_name(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{reap, sow_all, Seed};
    use grid_types::PoolConfig;
    use grid_types::WorkerSpec;

    const DICT: &str = "grid/messages";

    fn ids(raw: &[u32]) -> Vec<WorkerId> {
        raw.iter().copied().map(WorkerId).collect()
    }

    /// Pool of workers {2, 3, 4}: dictionary sown with every entry zero,
    /// then each worker sets its own entry to `id × 10`.
    async fn seeded_pool() -> (WorkerPool, Vec<WorkerId>) {
        let specs = vec![
            WorkerSpec::new(2, "a"),
            WorkerSpec::new(3, "a"),
            WorkerSpec::new(4, "a"),
        ];
        let pool = WorkerPool::spawn(PoolConfig::with_workers(specs)).unwrap();
        let participants = pool.workers();

        let zeroed = MessageDict::filled(participants.iter().copied(), Value::Int(0));
        sow_all(&pool, &participants, DICT, &Seed::value(Value::Dict(zeroed)))
            .await
            .unwrap();

        let handles = pool.submit_many(&participants, |_| {
            task(|ctx| {
                let own = Value::Int(ctx.id.0 as i64 * 10);
                match ctx.ns.read_mut(DICT).and_then(Value::as_dict_mut) {
                    Some(dict) => {
                        dict.set(ctx.id, own);
                        Ok(Value::Unit)
                    }
                    None => Err(GridError::UnboundName {
                        worker: ctx.id,
                        name: DICT.into(),
                    }),
                }
            })
        });
        for (_, result) in join_all(handles).await {
            result.unwrap();
        }

        (pool, participants)
    }

    fn expect_entries(dict: &MessageDict, pairs: &[(u32, i64)]) {
        assert_eq!(dict.len(), pairs.len());
        for &(id, n) in pairs {
            assert_eq!(dict.get(WorkerId(id)), Some(&Value::Int(n)), "entry {id}");
        }
    }

    #[tokio::test]
    async fn own_entry_reflects_local_mutation_before_swap() {
        let (pool, participants) = seeded_pool().await;

        let copies = reap(&pool, &participants, DICT).await.unwrap();
        let on_two = copies.value[&WorkerId(2)].as_dict().unwrap();
        expect_entries(on_two, &[(2, 20), (3, 0), (4, 0)]);
    }

    #[tokio::test]
    async fn swap_refreshes_every_copy() {
        let (pool, participants) = seeded_pool().await;

        let outcome = swap(&pool, &participants, DICT).await.unwrap();
        assert!(outcome.is_complete());

        let copies = reap(&pool, &participants, DICT).await.unwrap();
        for worker in &participants {
            let dict = copies.value[worker].as_dict().unwrap();
            expect_entries(dict, &[(2, 20), (3, 30), (4, 40)]);
        }
    }

    #[tokio::test]
    async fn swap_is_idempotent_without_mutation() {
        let (pool, participants) = seeded_pool().await;

        swap(&pool, &participants, DICT).await.unwrap();
        let first = reap(&pool, &participants, DICT).await.unwrap().value;

        swap(&pool, &participants, DICT).await.unwrap();
        let second = reap(&pool, &participants, DICT).await.unwrap().value;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn collect_reads_straight_from_owners() {
        let (pool, participants) = seeded_pool().await;

        // No swap first: collect reads each owner's own entry.
        let outcome = collect(&pool, DICT, &participants).await.unwrap();
        assert!(outcome.is_complete());
        expect_entries(&outcome.value, &[(2, 20), (3, 30), (4, 40)]);
    }

    #[tokio::test]
    async fn collect_into_folds_into_target_copy() {
        let (pool, participants) = seeded_pool().await;

        let outcome = collect_into(&pool, DICT, &participants, WorkerId(2))
            .await
            .unwrap();
        expect_entries(&outcome.value, &[(2, 20), (3, 30), (4, 40)]);

        // The fold actually landed in worker 2's copy.
        let copies = reap(&pool, &[WorkerId(2)], DICT).await.unwrap();
        let on_two = copies.value[&WorkerId(2)].as_dict().unwrap();
        expect_entries(on_two, &[(2, 20), (3, 30), (4, 40)]);
    }

    #[tokio::test]
    async fn swap_with_dead_participant_degrades() {
        let (mut pool, participants) = seeded_pool().await;
        pool.stop(WorkerId(4)).await;

        let outcome = swap(&pool, &participants, DICT).await.unwrap();

        // Every failed pair involves worker 4, on one side or the other:
        // (2,4) (3,4) (4,2) (4,3) (4,4).
        assert_eq!(outcome.failures.len(), 5);
        for failure in &outcome.failures {
            assert!(
                failure.source == WorkerId(4) || failure.target == Some(WorkerId(4)),
                "unexpected pair: {failure:?}"
            );
        }

        // Survivors refreshed the reachable entries; the dead worker's
        // entry is unchanged from before the call.
        let copies = reap(&pool, &ids(&[2, 3]), DICT).await.unwrap();
        for worker in ids(&[2, 3]) {
            let dict = copies.value[&worker].as_dict().unwrap();
            expect_entries(dict, &[(2, 20), (3, 30), (4, 0)]);
        }
    }

    #[tokio::test]
    async fn unbound_dictionary_reports_every_pair() {
        let pool = WorkerPool::spawn(PoolConfig::local(3)).unwrap();
        let participants = pool.workers();

        let outcome = swap(&pool, &participants, "nowhere").await.unwrap();
        assert_eq!(outcome.failures.len(), 9);
        assert!(outcome
            .failures
            .iter()
            .all(|f| matches!(f.reason, GridError::UnboundName { .. })));
    }

    #[tokio::test]
    async fn empty_participant_set_is_a_programmer_error() {
        let pool = WorkerPool::spawn(PoolConfig::local(1)).unwrap();

        assert!(matches!(
            swap(&pool, &[], DICT).await,
            Err(GridError::InvalidArgument(_))
        ));
        assert!(matches!(
            collect(&pool, DICT, &[]).await,
            Err(GridError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn non_dict_binding_is_reported() {
        let pool = WorkerPool::spawn(PoolConfig::local(2)).unwrap();
        let participants = pool.workers();

        sow_all(&pool, &participants, DICT, &Seed::value(7))
            .await
            .unwrap();

        let outcome = collect(&pool, DICT, &participants).await.unwrap();
        assert!(outcome.value.is_empty());
        assert!(outcome
            .failures
            .iter()
            .all(|f| matches!(f.reason, GridError::NotADict { .. })));
    }
}

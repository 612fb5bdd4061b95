//! Host-topology discovery: group worker ids by the host they run on.

use std::collections::BTreeMap;

use tracing::{info, warn};

use grid_pool::{join_all, task, WorkerPool};
use grid_types::error::Result;
use grid_types::{GridError, HostName, Value, WorkerId};

use crate::outcome::{self, Failure, Partial};

// ── HostFilter ────────────────────────────────────────────────────────────────

/// Predicate over host identities, applied to whole host groups.
#[derive(Debug, Clone)]
pub enum HostFilter {
    /// Keep every host.
    Any,
    /// Keep only hosts other than the controller's.
    RemoteOnly { controller: HostName },
    /// Keep exactly the controller's host.
    LocalOnly { controller: HostName },
}

impl HostFilter {
    pub fn any() -> Self {
        Self::Any
    }

    pub fn remote_only(controller: impl Into<HostName>) -> Self {
        Self::RemoteOnly {
            controller: controller.into(),
        }
    }

    pub fn local_only(controller: impl Into<HostName>) -> Self {
        Self::LocalOnly {
            controller: controller.into(),
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        match self {
            Self::Any => true,
            Self::RemoteOnly { controller } => host != controller,
            Self::LocalOnly { controller } => host == controller,
        }
    }
}

// ── Topology ──────────────────────────────────────────────────────────────────

/// Worker ids co-located on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGroup {
    pub host: HostName,
    /// First member in discovery order; speaks for the group.
    pub representative: WorkerId,
    /// All members, discovery order.
    pub members: Vec<WorkerId>,
}

/// Host groups keyed by representative id. One entry per distinct host
/// that survived the filter; every reachable worker appears in exactly
/// one group's members.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    groups: BTreeMap<WorkerId, HostGroup>,
}

impl Topology {
    /// Number of distinct hosts.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn representatives(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.groups.keys().copied()
    }

    pub fn groups(&self) -> impl Iterator<Item = &HostGroup> {
        self.groups.values()
    }

    pub fn get(&self, representative: WorkerId) -> Option<&HostGroup> {
        self.groups.get(&representative)
    }

    /// The group containing `worker`, if any.
    pub fn group_of(&self, worker: WorkerId) -> Option<&HostGroup> {
        self.groups.values().find(|g| g.members.contains(&worker))
    }

    /// Every member across all groups.
    pub fn all_members(&self) -> Vec<WorkerId> {
        self.groups.values().flat_map(|g| g.members.clone()).collect()
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Query every worker's host identity concurrently and group ids by
/// equal host.
///
/// Grouping follows the iteration order of `ids` — the first id seen on
/// a host becomes that group's representative, so passing ascending ids
/// yields the lowest-numeric-id representative. Workers whose host query
/// fails are excluded from every group and reported in `failures`; only
/// a pool that answers no query at all is a hard error.
pub async fn discover(
    pool: &WorkerPool,
    ids: &[WorkerId],
    filter: &HostFilter,
) -> Result<Partial<Topology>> {
    // Scatter all host queries, then gather.
    let handles: Vec<_> = ids
        .iter()
        .map(|&id| pool.submit(id, task(|ctx| Ok(Value::Text(ctx.host.clone())))))
        .collect();

    let mut failures = Vec::new();
    let mut observed: Vec<(WorkerId, HostName)> = Vec::new();
    for (worker, result) in join_all(handles).await {
        match result {
            Ok(Value::Text(host)) => observed.push((worker, host)),
            Ok(other) => failures.push(Failure {
                source: worker,
                target: None,
                reason: GridError::Task {
                    worker,
                    reason: format!("host query returned {}", other.type_name()),
                },
            }),
            Err(reason) => {
                warn!(%worker, %reason, "host query failed — excluding worker");
                failures.push(Failure {
                    source: worker,
                    target: None,
                    reason,
                });
            }
        }
    }

    if observed.is_empty() && outcome::total_failure(&failures, ids.len()) {
        return Err(GridError::PoolUnavailable(
            "no worker answered its host query".into(),
        ));
    }

    // Group by host identity; first-seen member is the representative.
    let mut by_host: BTreeMap<HostName, Vec<WorkerId>> = BTreeMap::new();
    for (worker, host) in observed {
        by_host.entry(host).or_default().push(worker);
    }

    let mut groups = BTreeMap::new();
    for (host, members) in by_host {
        if !filter.matches(&host) {
            continue;
        }
        let representative = members[0];
        groups.insert(
            representative,
            HostGroup {
                host,
                representative,
                members,
            },
        );
    }

    info!(hosts = groups.len(), excluded = failures.len(), "topology discovered");
    Ok(Partial::new(Topology { groups }, failures))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

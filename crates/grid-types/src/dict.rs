//! Per-worker copy of a named, replicated message dictionary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::WorkerId;
use crate::value::Value;

/// One worker's copy of a message dictionary: worker id → value.
///
/// Logically a single distributed entity addressed by a shared name;
/// physically each participant owns an independent copy. A worker mutates
/// only its own entry locally and learns every other entry through the
/// exchange protocol. There is no shared memory and no lock: between
/// exchanges a copy's foreign entries are exactly as stale as the last
/// swap/collect that touched them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDict {
    entries: BTreeMap<WorkerId, Value>,
}

impl MessageDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dictionary with one entry per id, every entry set to `fill`.
    /// The usual initial shape installed by the controller before any
    /// worker has computed its own entry.
    pub fn filled<I>(ids: I, fill: Value) -> Self
    where
        I: IntoIterator<Item = WorkerId>,
    {
        let entries = ids.into_iter().map(|id| (id, fill.clone())).collect();
        Self { entries }
    }

    pub fn get(&self, id: WorkerId) -> Option<&Value> {
        self.entries.get(&id)
    }

    /// Overwrite the entry for `id`. Last writer wins.
    pub fn set(&mut self, id: WorkerId, value: Value) {
        self.entries.insert(id, value);
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, &Value)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Durable snapshots of named bindings.
//!
//! A [`Snapshot`] captures selected bindings together with a creation
//! timestamp. Written to disk as CBOR; JSON export for inspection. The
//! synchronization core treats this as an opaque durable store for
//! initial and final state — nothing here participates in exchange
//! correctness.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use grid_types::{Namespace, Value};

use crate::error::{Result, StoreError};

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339 creation time.
    pub created_at: String,
    pub entries: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Capture the given bindings of `ns`. Unbound names are skipped:
    /// a snapshot records what exists, it does not invent defaults.
    pub fn capture(ns: &Namespace, names: &[&str]) -> Self {
        let mut entries = BTreeMap::new();
        for &name in names {
            if let Some(value) = ns.read(name) {
                entries.insert(name.to_string(), value.clone());
            }
        }
        Self {
            created_at: chrono::Utc::now().to_rfc3339(),
            entries,
        }
    }

    /// A snapshot holding a single value under `name`.
    pub fn single(name: &str, value: Value) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(name.to_string(), value);
        Self {
            created_at: chrono::Utc::now().to_rfc3339(),
            entries,
        }
    }

    /// Rebind every captured entry into `ns`. Last writer wins.
    pub fn apply(&self, ns: &mut Namespace) {
        for (name, value) in &self.entries {
            ns.bind(name.clone(), value.clone());
        }
    }
}

// ── Serialization ─────────────────────────────────────────────────────────────

/// Serialize a snapshot to CBOR and write it to `path`.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    ciborium::ser::into_writer(snapshot, &mut buf)
        .map_err(|e| StoreError::Serialization(format!("CBOR serialization: {e}")))?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Read a snapshot from a CBOR file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let data = std::fs::read(path)?;
    ciborium::de::from_reader(&data[..])
        .map_err(|e| StoreError::Serialization(format!("CBOR deserialization: {e}")))
}

/// Pretty-print a snapshot as JSON (useful for debugging / inspection).
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot)
        .map_err(|e| StoreError::Serialization(format!("JSON serialization: {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

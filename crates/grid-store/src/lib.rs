//! `grid-store` — Durable snapshots of grid state.

pub mod error;
pub mod snapshot;

pub use error::StoreError;
pub use snapshot::{read_snapshot, snapshot_to_json, write_snapshot, Snapshot};

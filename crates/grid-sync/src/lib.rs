//! `grid-sync` — Distributed state synchronization over a worker pool.
//!
//! This crate is a **coordination layer**, not a transport: every remote
//! effect goes through the `grid-pool` Remote Execution Primitive. It
//! provides the three pieces that make replicated per-worker state
//! usable:
//!
//! ```text
//!              ┌─ topology ──  which workers share a host
//! controller ──┼─ broadcast ─  sow / reap named bindings
//!              └─ exchange ──  swap (all-to-all) / collect (many-to-one)
//! ```
//!
//! Message dictionaries are replicated by convention — same name,
//! independently owned copies — and converge only through the exchange
//! protocol. Every fan-out call returns a [`Partial`] carrying both the
//! successful results and the failed (source, target) pairs.

pub mod broadcast;
pub mod exchange;
pub mod outcome;
pub mod timing;
pub mod topology;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use broadcast::{clear, reap, sow, sow_all, Seed};
pub use exchange::{collect, collect_into, swap};
pub use outcome::{Failure, Partial};
pub use timing::mean_duration;
pub use topology::{discover, HostFilter, HostGroup, Topology};

pub use grid_types::MessageDict;

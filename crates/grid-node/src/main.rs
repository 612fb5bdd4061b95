//! GridSync binary — local pool walk-through, topology inspection, and
//! swap benchmarking.
//!
//! ```bash
//! # Full sow → mutate → swap → collect walk-through on 3 workers
//! RUST_LOG=info cargo run --bin grid-node -- demo
//!
//! # Host-group discovery over a simulated two-host pool
//! cargo run --bin grid-node -- topology --workers 6 --hosts 2
//!
//! # Mean wall-clock cost of the O(P²) swap
//! cargo run --bin grid-node -- bench --workers 8 --reps 5
//! ```

use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use grid_pool::{join_all, task, Task, WorkerPool};
use grid_sync::{
    collect, discover, mean_duration, reap, sow_all, swap, HostFilter, Seed,
};
use grid_types::{GridError, MessageDict, PoolConfig, Value, WorkerSpec};

/// Shared name of the demo/bench message dictionary.
const DICT: &str = "grid/messages";

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "grid-node",
    version = env!("CARGO_PKG_VERSION"),
    about   = "GridSync — worker-pool state synchronization"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sow a dictionary, let each worker set its own entry, swap, collect.
    Demo {
        /// Write the collected dictionary to this path as a CBOR snapshot.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Discover host groups over a simulated multi-host pool.
    Topology {
        #[arg(long, default_value_t = 6)]
        workers: u32,

        /// Number of simulated hosts the workers are spread across.
        #[arg(long, default_value_t = 2)]
        hosts: u32,

        /// Keep every host, only the controller's, or only the others.
        #[arg(long, value_enum, default_value = "any")]
        filter: FilterArg,
    },

    /// Measure the mean wall-clock duration of a swap.
    Bench {
        #[arg(long, default_value_t = 8)]
        workers: u32,

        #[arg(long, default_value_t = 5)]
        reps: u32,

        /// Bytes of payload in each worker's dictionary entry.
        #[arg(long, default_value_t = 1024)]
        payload: usize,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Default log level: INFO. Override with RUST_LOG=grid_sync=debug etc.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Demo { snapshot } => run_demo(snapshot).await,
        Command::Topology {
            workers,
            hosts,
            filter,
        } => run_topology(workers, hosts, filter).await,
        Command::Bench {
            workers,
            reps,
            payload,
        } => run_bench(workers, reps, payload).await,
    }
}

// ── Demo ──────────────────────────────────────────────────────────────────────

/// The canonical walk-through: workers {2, 3, 4} start from a zeroed
/// dictionary, each computes `id × 10` into its own entry, a swap makes
/// every copy whole, and a collect reduces the entries to the controller.
async fn run_demo(snapshot: Option<PathBuf>) -> Result<()> {
    let specs = vec![
        WorkerSpec::new(2, "host-a"),
        WorkerSpec::new(3, "host-a"),
        WorkerSpec::new(4, "host-a"),
    ];
    let pool = WorkerPool::spawn(PoolConfig::with_workers(specs))?;
    let participants = pool.workers();

    // Install the shared dictionary: every entry zero.
    let zeroed = MessageDict::filled(participants.iter().copied(), Value::Int(0));
    sow_all(&pool, &participants, DICT, &Seed::value(Value::Dict(zeroed))).await?;
    info!(name = DICT, "dictionary sown");

    // Each worker computes its own entry locally.
    let handles = pool.submit_many(&participants, |_| set_own_entry());
    for (worker, result) in join_all(handles).await {
        result.with_context(|| format!("local mutation on worker {worker}"))?;
    }

    // All-to-all refresh: every copy now carries every entry.
    let outcome = swap(&pool, &participants, DICT).await?;
    info!(failed = outcome.failures.len(), "swap done");

    let copies = reap(&pool, &participants, DICT).await?;
    for (worker, value) in &copies.value {
        println!("worker {worker}: {value:?}");
    }

    // Many-to-one reduction into the controller.
    let reduced = collect(&pool, DICT, &participants).await?;
    println!("collected: {:?}", reduced.value);

    if let Some(path) = snapshot {
        let snap = grid_store::Snapshot::single(DICT, Value::Dict(reduced.value));
        grid_store::write_snapshot(&snap, &path)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        info!(path = %path.display(), "snapshot written");
    }

    Ok(())
}

/// Task setting the executing worker's own dictionary entry to `id × 10`.
fn set_own_entry() -> Task {
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
}

// ── Topology ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, clap::ValueEnum)]
enum FilterArg {
    Any,
    Local,
    Remote,
}

async fn run_topology(workers: u32, hosts: u32, filter: FilterArg) -> Result<()> {
    anyhow::ensure!(workers >= 1, "need at least one worker");
    anyhow::ensure!(hosts >= 1, "need at least one host");

    // Spread workers round-robin over the simulated hosts.
    let specs: Vec<WorkerSpec> = (1..=workers)
        .map(|id| WorkerSpec::new(id, &format!("host-{}", id % hosts)))
        .collect();
    let pool = WorkerPool::spawn(PoolConfig::with_workers(specs))?;
    let ids = pool.workers();

    let filter = match filter {
        FilterArg::Any => HostFilter::any(),
        FilterArg::Local => HostFilter::local_only(pool.controller_host()),
        FilterArg::Remote => HostFilter::remote_only(pool.controller_host()),
    };
    let outcome = discover(&pool, &ids, &filter).await?;
    for group in outcome.value.groups() {
        println!(
            "{}: representative {}, members {:?}",
            group.host,
            group.representative,
            group.members.iter().map(|w| w.0).collect::<Vec<_>>()
        );
    }
    if !outcome.is_complete() {
        for failure in &outcome.failures {
            println!("excluded worker {}: {}", failure.source, failure.reason);
        }
    }

    Ok(())
}

// ── Bench ─────────────────────────────────────────────────────────────────────

async fn run_bench(workers: u32, reps: u32, payload: usize) -> Result<()> {
    let reps = NonZeroU32::new(reps).context("reps must be ≥ 1")?;

    let pool = WorkerPool::spawn(PoolConfig::local(workers))?;
    let participants = pool.workers();

    let filled = MessageDict::filled(
        participants.iter().copied(),
        Value::Bytes(vec![0u8; payload]),
    );
    sow_all(&pool, &participants, DICT, &Seed::value(Value::Dict(filled))).await?;

    let pool_ref = &pool;
    let ids_ref = &participants;
    let mean = mean_duration(reps, || async move {
        // Ignore per-pair failures here — the bench measures the barrier.
        let _ = swap(pool_ref, ids_ref, DICT).await;
    })
    .await;

    println!(
        "mean swap over {} workers ({} fetches), {} reps: {:.6} s",
        workers,
        workers as u64 * workers as u64,
        reps,
        mean.as_secs_f64()
    );

    Ok(())
}

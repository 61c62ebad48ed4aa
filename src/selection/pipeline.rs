//! Selection Pipeline
//!
//! Runs distribute -> reduce -> merge for one rank, and reports what that
//! rank saw. Rank 0's report carries the final top-K.

use super::reducer::reduce_local;
use super::sharder::distribute;
use super::topk::top_k_count;
use super::tree::tree_merge;
use crate::molecule::generator::generate_data;
use crate::molecule::scoring::score;
use crate::molecule::types::Molecule;
use crate::transport::communicator::Communicator;
use crate::transport::local::LocalCommunicator;
use crate::transport::mailbox::is_group_abort;
use crate::transport::types::{ROOT, Rank, RunHeader};

use anyhow::{Result, anyhow, bail};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Wall-clock time spent in each phase on one rank.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhaseTimings {
    #[serde(serialize_with = "as_millis")]
    pub distribute: Duration,
    #[serde(serialize_with = "as_millis")]
    pub reduce: Duration,
    #[serde(serialize_with = "as_millis")]
    pub merge: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Outcome of the pipeline on one rank.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub rank: Rank,
    pub header: RunHeader,
    /// K, derived from the global item count.
    pub top_k: usize,
    /// Size of the shard this rank was given.
    pub local_count: usize,
    pub timings: PhaseTimings,
    /// The global top-K, ascending by rank key. Only set on rank 0.
    pub result: Option<Vec<Molecule>>,
}

/// Runs the pipeline for this rank with the default scoring function.
pub async fn run<C: Communicator>(
    comm: &C,
    source: Option<Vec<Molecule>>,
) -> Result<PipelineReport> {
    run_with_scorer(comm, source, score).await
}

/// Runs the pipeline for this rank.
///
/// The root passes the full source; every other rank passes `None`. All
/// ranks of the group must call this together.
pub async fn run_with_scorer<C, F>(
    comm: &C,
    source: Option<Vec<Molecule>>,
    scorer: F,
) -> Result<PipelineReport>
where
    C: Communicator,
    F: Fn(&mut Molecule) + Send + Sync,
{
    let rank = comm.rank();
    let mut timings = PhaseTimings::default();

    let started = Instant::now();
    let (header, shard) = distribute(comm, source).await?;
    timings.distribute = started.elapsed();

    let k = top_k_count(header.total);
    let local_count = shard.len();
    tracing::info!(
        "Rank {} run {}: {} of {} items, selecting top {}",
        rank,
        header.run_id.0,
        local_count,
        header.total,
        k
    );

    let started = Instant::now();
    let local = reduce_local(shard, k, scorer);
    timings.reduce = started.elapsed();
    tracing::info!("Rank {} reduced its shard to {} candidates", rank, local.len());

    let started = Instant::now();
    let result = tree_merge(comm, local, k).await?;
    timings.merge = started.elapsed();

    match &result {
        Some(top) => tracing::info!("Rank {} holds the global top {}", rank, top.len()),
        None => tracing::info!("Rank {} handed its candidates upward", rank),
    }

    Ok(PipelineReport {
        rank,
        header,
        top_k: k,
        local_count,
        timings,
        result,
    })
}

/// Generates `total` molecules and runs a `size`-rank group in this process.
pub async fn run_local_group(total: u64, size: usize, seed: u64) -> Result<PipelineReport> {
    if size == 0 {
        bail!("A group needs at least one rank");
    }

    let source = generate_data(total, seed);
    run_local_group_with(source, size, score).await
}

/// Runs a `size`-rank in-process group over `source` and returns rank 0's report.
///
/// Each rank is its own task. The first rank to fail aborts the others, and
/// the error from that rank is returned.
pub async fn run_local_group_with<F>(
    source: Vec<Molecule>,
    size: usize,
    scorer: F,
) -> Result<PipelineReport>
where
    F: Fn(&mut Molecule) + Clone + Send + Sync + 'static,
{
    if size == 0 {
        bail!("A group needs at least one rank");
    }

    let comms: Vec<Arc<LocalCommunicator>> = LocalCommunicator::group(size)
        .into_iter()
        .map(Arc::new)
        .collect();

    let mut source = Some(source);
    let mut tasks = JoinSet::new();

    for comm in comms.iter().cloned() {
        let source = if comm.rank() == ROOT { source.take() } else { None };
        let scorer = scorer.clone();

        tasks.spawn(async move {
            let result = run_with_scorer(comm.as_ref(), source, scorer).await;
            if let Err(e) = &result
                && !is_group_abort(e)
            {
                comm.abort(&format!("{:#}", e)).await;
            }
            (comm.rank(), result)
        });
    }

    let mut root_report = None;
    let mut local_failure = None;
    let mut abort_failure = None;

    while let Some(joined) = tasks.join_next().await {
        let (rank, result) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                for comm in comms.iter() {
                    comm.abort("a rank task panicked").await;
                }
                local_failure.get_or_insert(anyhow!("Rank task failed: {}", e));
                continue;
            }
        };

        match result {
            Ok(report) if rank == ROOT => root_report = Some(report),
            Ok(_) => {}
            Err(e) if is_group_abort(&e) => {
                abort_failure.get_or_insert(e);
            }
            Err(e) => {
                local_failure.get_or_insert(e.context(format!("Rank {} failed", rank)));
            }
        }
    }

    if let Some(e) = local_failure.or(abort_failure) {
        return Err(e);
    }

    root_report.ok_or_else(|| anyhow!("Rank {} produced no report", ROOT))
}

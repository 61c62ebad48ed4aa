//! Distribution Phase
//!
//! Tells every rank the global item count, then gives rank `i` the `i`-th of
//! `size` equal contiguous shards.
//!
//! The item count is expected to be a multiple of the group size. Any
//! remainder is not distributed to anyone. The root logs how many items
//! were dropped.

use crate::molecule::types::Molecule;
use crate::transport::collectives::{broadcast_header, scatter_shards};
use crate::transport::communicator::Communicator;
use crate::transport::types::{ROOT, RunHeader, RunId};

use anyhow::{Result, anyhow};
use std::ops::Range;

/// Items per shard. Integer division: a remainder is dropped.
pub fn shard_len(total: u64, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    (total / size as u64) as usize
}

/// Global index range of `rank`'s shard.
pub fn shard_bounds(rank: usize, total: u64, size: usize) -> Range<usize> {
    let len = shard_len(total, size);
    rank * len..(rank + 1) * len
}

/// Runs both distribution collectives and returns this rank's view of them.
///
/// The root passes the whole source; every other rank passes `None`.
pub async fn distribute<C: Communicator>(
    comm: &C,
    source: Option<Vec<Molecule>>,
) -> Result<(RunHeader, Vec<Molecule>)> {
    let header = if comm.rank() == ROOT {
        let source = source
            .as_ref()
            .ok_or_else(|| anyhow!("Root rank must supply the source data"))?;
        Some(RunHeader {
            run_id: RunId::new(),
            total: source.len() as u64,
        })
    } else {
        None
    };

    let header = broadcast_header(comm, header).await?;
    let len = shard_len(header.total, comm.size());

    if comm.rank() == ROOT {
        let dropped = header.total - (len * comm.size()) as u64;
        if dropped > 0 {
            tracing::warn!(
                "{} items is not a multiple of {} ranks, {} items will not be considered",
                header.total,
                comm.size(),
                dropped
            );
        }
    }

    let shard = scatter_shards(comm, source, len).await?;

    tracing::debug!(
        "Rank {} received shard {:?} ({} items)",
        comm.rank(),
        shard_bounds(comm.rank(), header.total, comm.size()),
        shard.len()
    );

    Ok((header, shard))
}

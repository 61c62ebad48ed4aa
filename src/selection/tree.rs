//! Tree Merge Phase
//!
//! Recursive doubling over an implicit binary tree. No tree structure is
//! built: each rank works out its role for a round from `(rank, step, size)`.
//!
//! ```text
//! size = 6    step=1    step=2    step=4
//! rank 0      <- 1      <- 2      <- 4
//! rank 2      <- 3      -> 0
//! rank 4      <- 5      idle      -> 0
//! ```
//!
//! A rank with no partner in a round (only when `size` is not a power of
//! two) carries its set into the next round unchanged. Rank 0 never sends,
//! so after `ceil(log2(size))` rounds it holds the global top-K.

use super::topk::merge_into;
use crate::molecule::types::Molecule;
use crate::transport::communicator::Communicator;
use crate::transport::types::{Frame, Rank};

use anyhow::{Result, bail};

/// What a rank does in one round of the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Take the working set of `from` and fold it into our own.
    Receive { from: Rank },
    /// Hand our working set to `to` and leave the merge.
    Send { to: Rank },
    /// No partner this round; keep the set as it is.
    Idle,
}

/// Role of `rank` in the round with doubling distance `step`.
///
/// Only meaningful for ranks still live at that round, that is ranks that
/// are multiples of `step`.
pub fn merge_action(rank: Rank, step: usize, size: usize) -> MergeAction {
    if rank % (2 * step) == 0 {
        let partner = rank + step;
        if partner < size {
            MergeAction::Receive { from: partner }
        } else {
            MergeAction::Idle
        }
    } else {
        MergeAction::Send { to: rank - step }
    }
}

/// Doubling distances of every round: `1, 2, 4, ...` while below `size`.
pub fn merge_steps(size: usize) -> impl Iterator<Item = usize> {
    std::iter::successors(Some(1usize), |step| step.checked_mul(2))
        .take_while(move |&step| step < size)
}

/// Runs the merge for this rank.
///
/// `working` must already be this rank's sorted local top-K. Returns the
/// global top-K on rank 0 and `None` on every rank that handed its set
/// upward.
pub async fn tree_merge<C: Communicator>(
    comm: &C,
    mut working: Vec<Molecule>,
    k: usize,
) -> Result<Option<Vec<Molecule>>> {
    let rank = comm.rank();

    for step in merge_steps(comm.size()) {
        match merge_action(rank, step, comm.size()) {
            MergeAction::Receive { from } => {
                let incoming = match comm.recv(from).await? {
                    Frame::Candidates { step: sent_at, items } if sent_at == step => items,
                    Frame::Candidates { step: sent_at, .. } => bail!(
                        "Rank {} expected candidates for step {} from rank {}, got step {}",
                        rank,
                        step,
                        from,
                        sent_at
                    ),
                    other => bail!(
                        "Rank {} expected Candidates from rank {}, got {}",
                        rank,
                        from,
                        other.kind()
                    ),
                };

                tracing::debug!(
                    "Rank {} step {}: merging {} candidates from rank {} into {}",
                    rank,
                    step,
                    incoming.len(),
                    from,
                    working.len()
                );
                merge_into(&mut working, incoming, k);
            }
            MergeAction::Send { to } => {
                tracing::debug!(
                    "Rank {} step {}: sending {} candidates to rank {}",
                    rank,
                    step,
                    working.len(),
                    to
                );
                comm.send(to, Frame::Candidates { step, items: working })
                    .await?;
                return Ok(None);
            }
            MergeAction::Idle => {
                tracing::debug!(
                    "Rank {} step {}: no partner, carrying {} candidates",
                    rank,
                    step,
                    working.len()
                );
            }
        }
    }

    Ok(Some(working))
}

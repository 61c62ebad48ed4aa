//! Local Reduction Phase
//!
//! Scores every molecule of the shard in place, then keeps the shard's own
//! top-K. The scorer sees one molecule at a time, so call order does not matter.

use super::topk::reduce_to_top_k;
use crate::molecule::types::Molecule;

/// Scores `shard` with `scorer` and reduces it to at most `k` items, sorted.
pub fn reduce_local<F>(mut shard: Vec<Molecule>, k: usize, scorer: F) -> Vec<Molecule>
where
    F: Fn(&mut Molecule),
{
    for molecule in shard.iter_mut() {
        scorer(molecule);
    }

    reduce_to_top_k(&mut shard, k);
    shard
}

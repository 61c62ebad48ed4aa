use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Number of descriptor values carried by every molecule.
pub const DESCRIPTOR_LEN: usize = 8;

/// Identity of a molecule within one run.
///
/// Assigned sequentially by the data source, so it doubles as the
/// tie-breaker when two molecules end up with the same score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MoleculeId(pub u64);

/// A candidate molecule.
///
/// Fixed-size value type: it is copied freely between ranks and has no
/// identity beyond its contents. `score` is left at `0.0` by the data source
/// and written exactly once by [`crate::molecule::scoring::score`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Molecule {
    pub id: MoleculeId,
    pub descriptors: [f32; DESCRIPTOR_LEN],
    pub score: f32,
}

impl Molecule {
    pub fn new(id: u64, descriptors: [f32; DESCRIPTOR_LEN]) -> Self {
        Self {
            id: MoleculeId(id),
            descriptors,
            score: 0.0,
        }
    }
}

/// Ranking order used everywhere in the pipeline.
///
/// Ascending by score (smaller is better) under IEEE total ordering, ties
/// broken by id. Every rank applies the same order, so the selected set is
/// identical no matter how the items were sharded.
pub fn by_rank_key(a: &Molecule, b: &Molecule) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.id.cmp(&b.id))
}

/// Returns `true` if `items` is sorted ascending by [`by_rank_key`].
#[cfg(test)]
pub(crate) fn is_ranked(items: &[Molecule]) -> bool {
    items
        .windows(2)
        .all(|pair| by_rank_key(&pair[0], &pair[1]) != Ordering::Greater)
}

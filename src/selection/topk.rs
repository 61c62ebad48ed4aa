use crate::molecule::types::{Molecule, by_rank_key};

/// Share of the global item count that makes the cut.
pub const TOP_PERCENT_DIVISOR: u64 = 100;

/// K for a run over `total` items: 1% of the global count, at least one.
///
/// Depends on the global count only, never on a rank's shard, so every rank
/// computes the same value.
pub fn top_k_count(total: u64) -> usize {
    (total / TOP_PERCENT_DIVISOR).max(1) as usize
}

/// Shrinks `items` to its `k` best entries, sorted ascending by rank key.
///
/// When there is more than `k`, only the best `k` are selected and sorted,
/// and the rest are never ordered. Otherwise the whole set is sorted. Both
/// paths give the same result as sorting everything and truncating.
pub fn reduce_to_top_k(items: &mut Vec<Molecule>, k: usize) {
    if k == 0 {
        items.clear();
        return;
    }

    if items.len() > k {
        items.select_nth_unstable_by(k - 1, by_rank_key);
        items.truncate(k);
    }
    items.sort_by(by_rank_key);
}

/// Folds `incoming` into the working set, keeping at most `k` items.
///
/// `incoming` may hold anywhere from zero to `k` items. An empty one leaves
/// `working` unchanged.
pub fn merge_into(working: &mut Vec<Molecule>, incoming: Vec<Molecule>, k: usize) {
    working.extend(incoming);
    reduce_to_top_k(working, k);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_count_minimum_is_one() {
        assert_eq!(top_k_count(0), 1);
        assert_eq!(top_k_count(1), 1);
        assert_eq!(top_k_count(199), 1);
    }

    #[test]
    fn test_top_k_count_is_one_percent() {
        assert_eq!(top_k_count(200), 2);
        assert_eq!(top_k_count(1000), 10);
        assert_eq!(top_k_count(123_456), 1234);
    }
}

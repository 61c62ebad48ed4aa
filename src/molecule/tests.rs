//! Molecule Module Tests
//!
//! ## Test Scopes
//! - **Ordering**: The rank key is total and deterministic, ties fall back to id.
//! - **Data Source**: Seeded generation is reproducible and sized exactly.
//! - **Scoring**: Pure per-item scoring, independent of call order.

#[cfg(test)]
mod tests {
    use crate::molecule::generator::generate_data;
    use crate::molecule::scoring::{energy, score};
    use crate::molecule::types::{
        DESCRIPTOR_LEN, Molecule, MoleculeId, by_rank_key, is_ranked,
    };
    use std::cmp::Ordering;

    fn scored(id: u64, value: f32) -> Molecule {
        let mut molecule = Molecule::new(id, [0.0; DESCRIPTOR_LEN]);
        molecule.score = value;
        molecule
    }

    // ============================================================
    // ORDERING TESTS
    // ============================================================

    #[test]
    fn test_lower_score_ranks_first() {
        let better = scored(7, -1.5);
        let worse = scored(1, 2.0);

        assert_eq!(by_rank_key(&better, &worse), Ordering::Less);
        assert_eq!(by_rank_key(&worse, &better), Ordering::Greater);
    }

    #[test]
    fn test_ties_break_by_id() {
        let a = scored(3, 0.25);
        let b = scored(9, 0.25);

        assert_eq!(by_rank_key(&a, &b), Ordering::Less);
        assert_eq!(by_rank_key(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_nan_scores_still_ordered() {
        let nan = scored(0, f32::NAN);
        let finite = scored(1, 1.0e9);

        // total_cmp places positive NaN after every finite value
        assert_eq!(by_rank_key(&finite, &nan), Ordering::Less);
    }

    #[test]
    fn test_is_ranked() {
        assert!(is_ranked(&[]));
        assert!(is_ranked(&[scored(0, 1.0)]));
        assert!(is_ranked(&[scored(0, -1.0), scored(1, 0.0), scored(2, 0.0)]));
        assert!(!is_ranked(&[scored(0, 1.0), scored(1, 0.5)]));
    }

    #[test]
    fn test_molecule_bincode_serialization() {
        let mut molecule = Molecule::new(42, [0.5; DESCRIPTOR_LEN]);
        score(&mut molecule);

        let encoded = bincode::serialize(&molecule).expect("Bincode serialization failed");
        let restored: Molecule =
            bincode::deserialize(&encoded).expect("Bincode deserialization failed");

        assert_eq!(restored, molecule);
        assert_eq!(restored.id, MoleculeId(42));
    }

    // ============================================================
    // DATA SOURCE TESTS
    // ============================================================

    #[test]
    fn test_generate_exact_count_with_sequential_ids() {
        let data = generate_data(250, 1);

        assert_eq!(data.len(), 250);
        for (i, molecule) in data.iter().enumerate() {
            assert_eq!(molecule.id, MoleculeId(i as u64));
            assert_eq!(molecule.score, 0.0, "Source data must be unscored");
        }
    }

    #[test]
    fn test_generate_is_reproducible() {
        assert_eq!(generate_data(64, 99), generate_data(64, 99));
        assert_ne!(generate_data(64, 99), generate_data(64, 100));
    }

    #[test]
    fn test_generate_descriptors_in_range() {
        for molecule in generate_data(100, 5) {
            for value in molecule.descriptors {
                assert!((-1.0..1.0).contains(&value), "Descriptor {} out of range", value);
            }
        }
    }

    #[test]
    fn test_generate_empty() {
        assert!(generate_data(0, 3).is_empty());
    }

    // ============================================================
    // SCORING TESTS
    // ============================================================

    #[test]
    fn test_score_is_pure() {
        let mut a = Molecule::new(1, [0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7, -0.8]);
        let mut b = a;
        b.id = MoleculeId(2);

        score(&mut a);
        score(&mut b);

        // Same descriptors, same score, regardless of identity
        assert_eq!(a.score, b.score);
        assert_eq!(a.score, energy(&a));

        // Rescoring does not drift
        let first = a.score;
        score(&mut a);
        assert_eq!(a.score, first);
    }

    #[test]
    fn test_score_independent_of_order() {
        let mut forward = generate_data(50, 11);
        let mut backward = forward.clone();

        forward.iter_mut().for_each(score);
        backward.iter_mut().rev().for_each(score);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_zero_descriptors_score_zero() {
        let molecule = Molecule::new(0, [0.0; DESCRIPTOR_LEN]);
        assert_eq!(energy(&molecule), 0.0);
    }
}

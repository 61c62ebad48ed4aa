//! Synthetic Data Source
//!
//! Produces the raw molecule set on the coordinating rank. The pipeline treats
//! this as an opaque producer of exactly `count` items.

use super::types::{DESCRIPTOR_LEN, Molecule};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates `count` unscored molecules with ids `0..count`.
///
/// Seeded, so the same `(count, seed)` always yields the same data set.
pub fn generate_data(count: u64, seed: u64) -> Vec<Molecule> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|id| {
            let mut descriptors = [0.0f32; DESCRIPTOR_LEN];
            for value in descriptors.iter_mut() {
                *value = rng.gen_range(-1.0..1.0);
            }
            Molecule::new(id, descriptors)
        })
        .collect()
}

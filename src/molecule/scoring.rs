//! Scoring Function
//!
//! Assigns each molecule its ranking score. Pure and per-item: no state is
//! shared between calls, so shards can be scored in any order.

use super::types::{DESCRIPTOR_LEN, Molecule};

/// Per-descriptor weights of the linear energy term.
const WEIGHTS: [f32; DESCRIPTOR_LEN] = [1.25, -0.8, 0.55, 2.1, -1.4, 0.3, 0.9, -0.65];

/// Strength of the pairwise interaction term.
const COUPLING: f32 = 0.15;

/// Computes a binding-energy style score. Lower is better.
pub fn energy(molecule: &Molecule) -> f32 {
    let d = &molecule.descriptors;

    let linear: f32 = d.iter().zip(WEIGHTS.iter()).map(|(x, w)| x * w).sum();
    let coupling: f32 = d.windows(2).map(|pair| pair[0] * pair[1]).sum();
    let strain: f32 = d.iter().map(|x| x * x).sum::<f32>().sqrt();

    linear + COUPLING * coupling + 0.5 * strain
}

/// Writes the molecule's score in place.
pub fn score(molecule: &mut Molecule) {
    molecule.score = energy(molecule);
}

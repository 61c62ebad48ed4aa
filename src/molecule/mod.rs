//! Molecule Module
//!
//! The item model the selection pipeline ranks, plus the two collaborators that
//! produce and score items.
//!
//! ## Submodules
//! - **`types`**: The fixed-size `Molecule` record and its ranking order.
//! - **`generator`**: Synthetic data source. Only the coordinating rank calls it.
//! - **`scoring`**: Pure per-molecule scoring function that fills in `score`.

pub mod generator;
pub mod scoring;
pub mod types;

#[cfg(test)]
mod tests;

//! Distributed Top-K Selection Library
//!
//! Selects the best 1% of a scored molecule set spread over a fixed group of
//! ranks that share no memory. This crate backs the `topk-select` binary
//! (`main.rs`).
//!
//! ## Architecture Modules
//! - **`molecule`**: The item record, its ranking order, the synthetic data source and the
//!   scoring function.
//! - **`transport`**: The process group. Holds the `Communicator` trait, the wire `Frame`s, and the
//!   in-process and TCP transports, plus broadcast/scatter collectives.
//! - **`selection`**: The selection protocol. Sharding, local top-K reduction, and the
//!   recursive-doubling tree merge that converges on rank 0.
//! - **`config`**: Command-line configuration of a run.

pub mod config;
pub mod molecule;
pub mod selection;
pub mod transport;

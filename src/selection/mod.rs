//! Distributed Top-K Selection
//!
//! Finds the best 1% of a molecule set spread over a group of ranks. Every
//! rank runs the same three phases in lockstep, and the exact global top-K ends
//! up on rank 0.
//!
//! ## Pipeline
//! 1. **Distribute** (`sharder`): The root broadcasts the item count, then scatters equal
//!    contiguous shards.
//! 2. **Reduce** (`reducer`): Each rank scores its shard in place and keeps its local top-K.
//! 3. **Merge** (`tree`): Recursive doubling. At round `step`, ranks that are multiples of
//!    `2*step` absorb the set of `rank + step`, and every other live rank sends once and drops out.
//!
//! ## Submodules
//! - **`topk`**: K from the global count, and the shared reduce/merge primitive.
//! - **`sharder`**: Distribution phase.
//! - **`reducer`**: Local scoring and reduction.
//! - **`tree`**: Rank arithmetic of the merge tree and the merge protocol itself.
//! - **`pipeline`**: Wires the phases together for one rank, or for a whole in-process group.

pub mod pipeline;
pub mod reducer;
pub mod sharder;
pub mod topk;
pub mod tree;

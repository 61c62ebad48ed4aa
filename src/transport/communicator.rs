use super::types::{Frame, Rank};

use anyhow::Result;
use std::future::Future;

/// A fixed-size, ordered group of ranks that exchange `Frame`s.
///
/// Rank and size are properties of the value, not ambient state, so the
/// same protocol code runs over TCP between processes or over channels
/// between tasks of one test.
///
/// `send` and `recv` block (await) until the frame is handed off or
/// arrives. There are no timeouts: a frame that never arrives stalls the
/// receiver until the group is aborted.
pub trait Communicator: Send + Sync {
    fn rank(&self) -> Rank;

    fn size(&self) -> usize;

    /// Delivers `frame` to `dest`. Frames to one destination keep their order.
    fn send(&self, dest: Rank, frame: Frame) -> impl Future<Output = Result<()>> + Send;

    /// Waits for the next frame from `src`.
    ///
    /// An `Abort` from any peer surfaces here as an error.
    fn recv(&self, src: Rank) -> impl Future<Output = Result<Frame>> + Send;

    /// Best-effort notification of every other rank that the run is over.
    fn abort(&self, reason: &str) -> impl Future<Output = ()> + Send;
}

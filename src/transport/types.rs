use crate::molecule::types::Molecule;
use serde::{Deserialize, Serialize};

/// A process's index in the group, `0 <= rank < size`.
pub type Rank = usize;

/// The rank that holds the source data and the final result.
pub const ROOT: Rank = 0;

/// Identifier of a single selection run, used to correlate logs across ranks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

/// Broadcast from the root before sharding. Every rank derives its shard
/// length and K from `total`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunHeader {
    pub run_id: RunId,
    pub total: u64,
}

/// The wire protocol between ranks.
///
/// - `Hello`: First frame on every TCP stream, names the sending rank.
/// - `Header`/`Shard`: The two collectives of the distribution phase.
/// - `Candidates`: A working set moving up the merge tree at round `step`.
///   The item count is whatever the sender held, never padded to K.
/// - `Abort`: Tears the whole group down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Frame {
    Hello {
        from: Rank,
    },

    Header(RunHeader),

    Shard {
        items: Vec<Molecule>,
    },

    Candidates {
        step: usize,
        items: Vec<Molecule>,
    },

    Abort {
        from: Rank,
        reason: String,
    },
}

impl Frame {
    /// Short variant name for log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Hello { .. } => "Hello",
            Frame::Header(_) => "Header",
            Frame::Shard { .. } => "Shard",
            Frame::Candidates { .. } => "Candidates",
            Frame::Abort { .. } => "Abort",
        }
    }
}

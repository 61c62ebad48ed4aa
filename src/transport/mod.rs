//! Process Group Transport
//!
//! Message-passing layer shared by every rank of a selection run. Ranks never
//! share memory; everything moves as `Frame`s over a `Communicator`.
//!
//! ## Core Mechanisms
//! - **Point-to-point**: `send`/`recv` between two ranks. Frames from one source arrive in
//!   send order.
//! - **Collectives**: Broadcast and scatter are built from point-to-point sends out of the root.
//! - **Group abort**: A failing rank sends `Abort` to every peer, so nobody blocks on a message
//!   that will never come.
//!
//! ## Submodules
//! - **`types`**: Wire protocol (`Frame`) and the broadcast `RunHeader`.
//! - **`communicator`**: The `Communicator` trait every transport implements.
//! - **`mailbox`**: Per-source inboxes used by both transports.
//! - **`codec`**: Length-prefixed bincode framing for byte streams.
//! - **`local`**: In-process group over tokio channels (tests, single-process runs).
//! - **`tcp`**: Multi-process group over TCP.
//! - **`collectives`**: Broadcast and scatter.

pub mod codec;
pub mod collectives;
pub mod communicator;
pub mod local;
pub mod mailbox;
pub mod tcp;
pub mod types;

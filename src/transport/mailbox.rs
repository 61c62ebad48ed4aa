//! Per-Source Inboxes
//!
//! Each rank owns one `Mailbox` with a FIFO inbox per peer, so `recv(src)`
//! only ever sees frames from `src`, in the order `src` sent them. Abort
//! notices bypass the inboxes and wake every pending `recv` at once.

use super::types::{Frame, Rank};

use anyhow::{Result, anyhow};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};

/// Error returned by `recv` once any rank has torn the group down.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAborted {
    pub from: Rank,
    pub reason: String,
}

impl fmt::Display for GroupAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run aborted by rank {}: {}", self.from, self.reason)
    }
}

impl std::error::Error for GroupAborted {}

/// Returns `true` if `err` is a peer's abort rather than a local failure.
pub fn is_group_abort(err: &anyhow::Error) -> bool {
    err.downcast_ref::<GroupAborted>().is_some()
}

/// Receiving side, owned by a single rank.
pub struct Mailbox {
    inboxes: Vec<Mutex<mpsc::UnboundedReceiver<Frame>>>,
    aborted: watch::Receiver<Option<GroupAborted>>,
}

/// Delivery side. Cloned into whatever feeds the mailbox: peer tasks for the
/// local transport, stream readers for TCP.
#[derive(Clone)]
pub struct MailboxSender {
    inboxes: Arc<Vec<mpsc::UnboundedSender<Frame>>>,
    aborted: Arc<watch::Sender<Option<GroupAborted>>>,
}

/// Creates a mailbox with one inbox per rank of a `size`-rank group.
pub fn mailbox(size: usize) -> (MailboxSender, Mailbox) {
    let (abort_tx, abort_rx) = watch::channel(None);
    let mut senders = Vec::with_capacity(size);
    let mut receivers = Vec::with_capacity(size);

    for _ in 0..size {
        let (tx, rx) = mpsc::unbounded_channel();
        senders.push(tx);
        receivers.push(Mutex::new(rx));
    }

    (
        MailboxSender {
            inboxes: Arc::new(senders),
            aborted: Arc::new(abort_tx),
        },
        Mailbox {
            inboxes: receivers,
            aborted: abort_rx,
        },
    )
}

impl MailboxSender {
    /// Files `frame` under the inbox of `src`.
    pub fn deliver(&self, src: Rank, frame: Frame) -> Result<()> {
        if let Frame::Abort { from, reason } = frame {
            tracing::warn!("Rank {} aborted the run: {}", from, reason);
            self.aborted.send_replace(Some(GroupAborted { from, reason }));
            return Ok(());
        }

        let inbox = self
            .inboxes
            .get(src)
            .ok_or_else(|| anyhow!("Frame from unknown rank {}", src))?;

        inbox
            .send(frame)
            .map_err(|_| anyhow!("Inbox for rank {} is closed", src))
    }
}

impl Mailbox {
    /// Waits for the next frame from `src`, or fails as soon as any rank aborts.
    pub async fn recv(&self, src: Rank) -> Result<Frame> {
        let inbox = self
            .inboxes
            .get(src)
            .ok_or_else(|| anyhow!("Cannot receive from unknown rank {}", src))?;
        let mut inbox = inbox.lock().await;
        let mut aborted = self.aborted.clone();

        if let Some(notice) = aborted.borrow_and_update().clone() {
            return Err(notice.into());
        }

        let woke_by_abort = tokio::select! {
            frame = inbox.recv() => {
                return frame.ok_or_else(|| anyhow!("Channel from rank {} closed", src));
            }
            changed = aborted.changed() => changed.is_ok(),
        };

        if woke_by_abort && let Some(notice) = self.abort_notice() {
            return Err(notice.into());
        }

        // Every delivery handle is gone, only queued frames remain.
        inbox
            .recv()
            .await
            .ok_or_else(|| anyhow!("Channel from rank {} closed", src))
    }

    pub(crate) fn abort_notice(&self) -> Option<GroupAborted> {
        self.aborted.borrow().clone()
    }
}

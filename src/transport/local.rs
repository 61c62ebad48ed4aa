//! In-Process Group
//!
//! Runs every rank inside one process, each as its own task, connected by
//! tokio channels. Used by the `--ranks` mode and by the protocol tests.

use super::communicator::Communicator;
use super::mailbox::{Mailbox, MailboxSender, mailbox};
use super::types::{Frame, Rank};

use anyhow::{Result, anyhow};
use std::sync::Arc;

pub struct LocalCommunicator {
    rank: Rank,
    peers: Arc<Vec<MailboxSender>>,
    mailbox: Mailbox,
}

impl LocalCommunicator {
    /// Builds a fully connected group of `size` ranks, returned in rank order.
    pub fn group(size: usize) -> Vec<LocalCommunicator> {
        let (senders, mailboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| mailbox(size)).unzip();
        let peers = Arc::new(senders);

        mailboxes
            .into_iter()
            .enumerate()
            .map(|(rank, mailbox)| LocalCommunicator {
                rank,
                peers: peers.clone(),
                mailbox,
            })
            .collect()
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    async fn send(&self, dest: Rank, frame: Frame) -> Result<()> {
        let peer = self
            .peers
            .get(dest)
            .ok_or_else(|| anyhow!("Rank {} cannot send to unknown rank {}", self.rank, dest))?;
        peer.deliver(self.rank, frame)
    }

    async fn recv(&self, src: Rank) -> Result<Frame> {
        self.mailbox.recv(src).await
    }

    async fn abort(&self, reason: &str) {
        for (dest, peer) in self.peers.iter().enumerate() {
            if dest == self.rank {
                continue;
            }
            let frame = Frame::Abort {
                from: self.rank,
                reason: reason.to_string(),
            };
            if let Err(e) = peer.deliver(self.rank, frame) {
                tracing::debug!(
                    "Rank {} could not notify rank {} of abort: {}",
                    self.rank,
                    dest,
                    e
                );
            }
        }
    }
}

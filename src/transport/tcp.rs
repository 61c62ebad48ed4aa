//! TCP Process Group
//!
//! One OS process per rank. Every rank listens on its own entry of the peers
//! list and opens outbound streams lazily, the first time it sends to a peer.
//!
//! ## Stream Lifecycle
//! 1. **Connect**: The sender dials the peer with exponential backoff, since peers may
//!    still be starting. Aborts use the same window and reach every peer at once.
//! 2. **Hello**: The first frame on the stream names the sending rank.
//! 3. **Pump**: The receiving side files every later frame under that rank's inbox.
//!
//! A rank that finishes early just closes its streams. Peers read that as a
//! clean end of stream.

use super::codec::{read_frame, write_frame};
use super::communicator::Communicator;
use super::mailbox::{Mailbox, MailboxSender, mailbox};
use super::types::{Frame, Rank};

use anyhow::{Context, Result, anyhow, bail};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};

const CONNECT_ATTEMPTS: usize = 40;
const CONNECT_BASE_DELAY_MS: u64 = 100;
const CONNECT_MAX_DELAY_MS: u64 = 2000;

pub struct TcpCommunicator {
    rank: Rank,
    peers: Vec<SocketAddr>,
    mailbox: Mailbox,
    loopback: MailboxSender,
    outbound: DashMap<Rank, Arc<Mutex<TcpStream>>>,
    accept_handle: JoinHandle<()>,
}

impl TcpCommunicator {
    /// Binds this rank's listen address and starts accepting peer streams.
    ///
    /// Fails before any data moves if the peers list is empty, the rank is
    /// outside it, or the address cannot be bound.
    pub async fn bind(rank: Rank, peers: Vec<SocketAddr>) -> Result<Self> {
        validate_topology(rank, &peers)?;

        let addr = peers[rank];
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Rank {} failed to bind {}", rank, addr))?;

        Self::with_listener(rank, peers, listener)
    }

    /// Same as [`TcpCommunicator::bind`] with an already bound listener.
    pub fn with_listener(
        rank: Rank,
        peers: Vec<SocketAddr>,
        listener: TcpListener,
    ) -> Result<Self> {
        validate_topology(rank, &peers)?;

        let (inbox, mailbox) = mailbox(peers.len());
        let accept_handle = tokio::spawn(accept_loop(listener, inbox.clone(), peers.len()));

        tracing::info!("Rank {}/{} listening on {}", rank, peers.len(), peers[rank]);

        Ok(Self {
            rank,
            peers,
            mailbox,
            loopback: inbox,
            outbound: DashMap::new(),
            accept_handle,
        })
    }

    async fn connection(&self, dest: Rank) -> Result<Arc<Mutex<TcpStream>>> {
        let existing = self.outbound.get(&dest).map(|entry| entry.value().clone());
        if let Some(stream) = existing {
            return Ok(stream);
        }

        let addr = *self
            .peers
            .get(dest)
            .ok_or_else(|| anyhow!("Rank {} cannot send to unknown rank {}", self.rank, dest))?;

        let stream = dial(self.rank, addr).await?;
        tracing::debug!("Rank {} connected to rank {} at {}", self.rank, dest, addr);

        let stream = Arc::new(Mutex::new(stream));
        self.outbound.insert(dest, stream.clone());
        Ok(stream)
    }
}

impl Drop for TcpCommunicator {
    fn drop(&mut self) {
        self.accept_handle.abort();
    }
}

impl Communicator for TcpCommunicator {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    async fn send(&self, dest: Rank, frame: Frame) -> Result<()> {
        if dest == self.rank {
            return self.loopback.deliver(self.rank, frame);
        }

        let kind = frame.kind();
        let stream = self.connection(dest).await?;
        let mut stream = stream.lock().await;

        write_frame(&mut *stream, &frame)
            .await
            .with_context(|| format!("Rank {} failed to send {} to rank {}", self.rank, kind, dest))
    }

    async fn recv(&self, src: Rank) -> Result<Frame> {
        self.mailbox.recv(src).await
    }

    async fn abort(&self, reason: &str) {
        let mut deliveries = JoinSet::new();

        for (dest, &addr) in self.peers.iter().enumerate() {
            if dest == self.rank {
                continue;
            }

            let existing = self.outbound.get(&dest).map(|entry| entry.value().clone());
            let frame = Frame::Abort {
                from: self.rank,
                reason: reason.to_string(),
            };
            let rank = self.rank;

            deliveries.spawn(async move {
                let stream = match existing {
                    Some(stream) => stream,
                    None => Arc::new(Mutex::new(dial(rank, addr).await?)),
                };
                let mut stream = stream.lock().await;
                write_frame(&mut *stream, &frame).await
            });
            tracing::debug!("Rank {} delivering abort to rank {}", self.rank, dest);
        }

        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Failed to deliver abort: {:#}", e),
                Err(e) => tracing::warn!("Abort delivery task failed: {}", e),
            }
        }
    }
}

fn validate_topology(rank: Rank, peers: &[SocketAddr]) -> Result<()> {
    if peers.is_empty() {
        bail!("Peer list is empty, a group needs at least one rank");
    }
    if rank >= peers.len() {
        bail!("Rank {} is outside the {}-rank peer list", rank, peers.len());
    }
    Ok(())
}

/// Opens a stream to a peer and introduces this rank on it.
///
/// Waits out the full retry window, so a peer that starts late still gets
/// whatever is sent, aborts included.
async fn dial(rank: Rank, addr: SocketAddr) -> Result<TcpStream> {
    let mut stream = connect_with_retry(addr, CONNECT_ATTEMPTS).await?;
    stream.set_nodelay(true)?;
    write_frame(&mut stream, &Frame::Hello { from: rank }).await?;
    Ok(stream)
}

async fn connect_with_retry(addr: SocketAddr, attempts: usize) -> Result<TcpStream> {
    let mut delay_ms = CONNECT_BASE_DELAY_MS;

    for attempt in 0..attempts {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                if attempt + 1 == attempts {
                    return Err(anyhow!(e).context(format!("Failed to connect to {}", addr)));
                }
                tracing::debug!("Connect to {} failed (attempt {}): {}", addr, attempt + 1, e);
                let jitter = rand::random::<u64>() % 50;
                tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                delay_ms = (delay_ms * 2).min(CONNECT_MAX_DELAY_MS);
            }
        }
    }

    Err(anyhow!("Connect attempts to {} exhausted", addr))
}

async fn accept_loop(listener: TcpListener, inbox: MailboxSender, size: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let inbox = inbox.clone();
                tokio::spawn(async move {
                    if let Err(e) = pump_frames(stream, &inbox, size).await {
                        tracing::warn!("Stream from {} failed: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                tracing::error!("Failed to accept peer stream: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn pump_frames(mut stream: TcpStream, inbox: &MailboxSender, size: usize) -> Result<()> {
    let from = match read_frame(&mut stream).await? {
        Some(Frame::Hello { from }) if from < size => from,
        Some(Frame::Hello { from }) => {
            bail!("Hello from rank {} outside a {}-rank group", from, size)
        }
        Some(other) => bail!("Expected Hello, got {}", other.kind()),
        None => return Ok(()),
    };

    tracing::debug!("Accepted stream from rank {}", from);

    while let Some(frame) = read_frame(&mut stream).await? {
        inbox.deliver(from, frame)?;
    }

    tracing::debug!("Rank {} closed its stream", from);
    Ok(())
}

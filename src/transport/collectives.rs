//! Collective Operations
//!
//! Broadcast and scatter, built from point-to-point sends out of the root.
//! Every rank of the group must call the same collective in the same order.

use super::communicator::Communicator;
use super::types::{Frame, ROOT, RunHeader};
use crate::molecule::types::Molecule;

use anyhow::{Result, anyhow, bail};

/// Sends the root's header to every rank and returns it everywhere.
///
/// Only the root supplies `header`. Other ranks block until it arrives.
pub async fn broadcast_header<C: Communicator>(
    comm: &C,
    header: Option<RunHeader>,
) -> Result<RunHeader> {
    if comm.rank() == ROOT {
        let header = header.ok_or_else(|| anyhow!("Root rank must supply the run header"))?;
        for dest in (0..comm.size()).filter(|&dest| dest != ROOT) {
            comm.send(dest, Frame::Header(header.clone())).await?;
        }
        return Ok(header);
    }

    match comm.recv(ROOT).await? {
        Frame::Header(header) => Ok(header),
        other => bail!(
            "Rank {} expected Header from root, got {}",
            comm.rank(),
            other.kind()
        ),
    }
}

/// Items carried by one `Shard` frame.
///
/// A molecule encodes to 44 bytes, so a full chunk stays far below
/// [`MAX_FRAME_LEN`](super::codec::MAX_FRAME_LEN).
pub const SHARD_CHUNK_LEN: usize = 1_000_000;

/// Hands `shard_len` contiguous items to each rank, shard `i` to rank `i`.
///
/// The root supplies the full source, which must hold at least
/// `shard_len * size` items. Anything past that is not distributed.
pub async fn scatter_shards<C: Communicator>(
    comm: &C,
    source: Option<Vec<Molecule>>,
    shard_len: usize,
) -> Result<Vec<Molecule>> {
    scatter_shards_chunked(comm, source, shard_len, SHARD_CHUNK_LEN).await
}

/// [`scatter_shards`] with an explicit frame size.
///
/// Each shard travels as consecutive `Shard` frames of at most `chunk_len`
/// items. Receivers reassemble until they hold exactly `shard_len`.
pub async fn scatter_shards_chunked<C: Communicator>(
    comm: &C,
    source: Option<Vec<Molecule>>,
    shard_len: usize,
    chunk_len: usize,
) -> Result<Vec<Molecule>> {
    let chunk_len = chunk_len.max(1);

    if comm.rank() == ROOT {
        let mut source = source.ok_or_else(|| anyhow!("Root rank must supply the source data"))?;
        let needed = shard_len * comm.size();
        if source.len() < needed {
            bail!(
                "Source produced {} items, {} needed for {} shards of {}",
                source.len(),
                needed,
                comm.size(),
                shard_len
            );
        }

        for dest in (0..comm.size()).filter(|&dest| dest != ROOT) {
            let start = dest * shard_len;
            for chunk in source[start..start + shard_len].chunks(chunk_len) {
                let items = chunk.to_vec();
                comm.send(dest, Frame::Shard { items }).await?;
            }
        }

        source.truncate(shard_len);
        return Ok(source);
    }

    let mut shard = Vec::with_capacity(shard_len);
    while shard.len() < shard_len {
        match comm.recv(ROOT).await? {
            Frame::Shard { items } if shard.len() + items.len() <= shard_len => {
                shard.extend(items)
            }
            Frame::Shard { items } => bail!(
                "Rank {} expected a shard of {} items, got at least {}",
                comm.rank(),
                shard_len,
                shard.len() + items.len()
            ),
            other => bail!(
                "Rank {} expected Shard from root, got {}",
                comm.rank(),
                other.kind()
            ),
        }
    }
    Ok(shard)
}

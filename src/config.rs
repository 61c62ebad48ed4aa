//! Run Configuration
//!
//! Command-line parsing for the `topk-select` binary. A run is either a whole
//! group in one process (`--ranks`) or one rank of a TCP group (`--rank` plus
//! `--peers`).

use crate::transport::types::{ROOT, Rank};

use anyhow::{Context, Result, anyhow, bail};
use std::net::SocketAddr;
use tracing::Level;

pub const DEFAULT_RANKS: usize = 4;
pub const DEFAULT_SEED: u64 = 42;

/// How the process group is formed.
#[derive(Debug, Clone, PartialEq)]
pub enum Topology {
    /// All ranks run as tasks of this process.
    Local { ranks: usize },
    /// This process is `rank` of a TCP group. `peers[i]` is rank `i`'s listen address.
    Tcp { rank: Rank, peers: Vec<SocketAddr> },
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Raw item count. Only the root rank interprets it.
    pub count_arg: Option<String>,
    pub topology: Topology,
    pub seed: u64,
    pub json: bool,
    pub log_level: Level,
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {0} num_data [--ranks P] [--seed S] [--json] [--log-level L]\n       \
         {0} [num_data] --rank R --peers ADDR0,ADDR1,... [--seed S] [--json] [--log-level L]",
        program
    )
}

impl RunConfig {
    /// Parses the arguments that follow the program name.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut count_arg: Option<String> = None;
        let mut ranks: Option<usize> = None;
        let mut rank: Option<Rank> = None;
        let mut peers: Option<Vec<SocketAddr>> = None;
        let mut seed = DEFAULT_SEED;
        let mut json = false;
        let mut log_level = Level::INFO;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--ranks" => {
                    let value = flag_value(args, i)?;
                    ranks = Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid --ranks value \"{}\"", value))?,
                    );
                    i += 2;
                }
                "--rank" => {
                    let value = flag_value(args, i)?;
                    rank = Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid --rank value \"{}\"", value))?,
                    );
                    i += 2;
                }
                "--peers" => {
                    peers = Some(parse_peers(flag_value(args, i)?)?);
                    i += 2;
                }
                "--seed" => {
                    let value = flag_value(args, i)?;
                    seed = value
                        .parse()
                        .with_context(|| format!("Invalid --seed value \"{}\"", value))?;
                    i += 2;
                }
                "--log-level" => {
                    let value = flag_value(args, i)?;
                    log_level = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid --log-level value \"{}\"", value))?;
                    i += 2;
                }
                "--json" => {
                    json = true;
                    i += 1;
                }
                flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
                positional => {
                    if count_arg.is_some() {
                        bail!("Unexpected extra argument \"{}\"", positional);
                    }
                    count_arg = Some(positional.to_string());
                    i += 1;
                }
            }
        }

        let topology = match (ranks, rank, peers) {
            (None, None, None) => Topology::Local {
                ranks: DEFAULT_RANKS,
            },
            (Some(0), None, None) => bail!("--ranks must be at least 1"),
            (Some(ranks), None, None) => Topology::Local { ranks },
            (None, Some(rank), Some(peers)) => {
                if rank >= peers.len() {
                    bail!("--rank {} is outside the {} listed peers", rank, peers.len());
                }
                Topology::Tcp { rank, peers }
            }
            (None, Some(_), None) => bail!("--rank requires --peers"),
            (None, None, Some(_)) => bail!("--peers requires --rank"),
            (Some(_), _, _) => bail!("--ranks cannot be combined with --rank/--peers"),
        };

        Ok(Self {
            count_arg,
            topology,
            seed,
            json,
            log_level,
        })
    }

    /// Interprets the item count. Called on the root rank only.
    pub fn parse_count(&self) -> Result<u64> {
        parse_count(self.count_arg.as_deref())
    }
}

/// Picks `--rank` and `--peers` out of arguments that failed to parse.
///
/// A rank whose command line is rejected still knows enough to tell the rest
/// of its group to stop. Returns `None` unless both flags are present and
/// valid with the rank inside the peer list.
pub fn recover_tcp_rank(args: &[String]) -> Option<(Rank, Vec<SocketAddr>)> {
    let value_of = |flag: &str| {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    };

    let rank: Rank = value_of("--rank")?.parse().ok()?;
    let peers = parse_peers(value_of("--peers")?).ok()?;
    (rank < peers.len()).then_some((rank, peers))
}

/// Parses a non-negative item count.
pub fn parse_count(arg: Option<&str>) -> Result<u64> {
    let arg = arg.ok_or_else(|| anyhow!("Missing num_data argument, required on rank {}", ROOT))?;
    arg.trim()
        .parse::<u64>()
        .map_err(|_| anyhow!("Unable to understand the number \"{}\"", arg))
}

fn flag_value(args: &[String], i: usize) -> Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", args[i]))
}

fn parse_peers(list: &str) -> Result<Vec<SocketAddr>> {
    let peers = list
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(|addr| {
            addr.parse::<SocketAddr>()
                .with_context(|| format!("Invalid peer address \"{}\"", addr))
        })
        .collect::<Result<Vec<_>>>()?;

    if peers.is_empty() {
        bail!("--peers lists no addresses");
    }
    Ok(peers)
}

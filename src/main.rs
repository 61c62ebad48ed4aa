use distributed_topk::config::{RunConfig, Topology, recover_tcp_rank, usage};
use distributed_topk::molecule::generator::generate_data;
use distributed_topk::selection::pipeline::{self, PipelineReport, run_local_group};
use distributed_topk::transport::communicator::Communicator;
use distributed_topk::transport::mailbox::is_group_abort;
use distributed_topk::transport::tcp::TcpCommunicator;
use distributed_topk::transport::types::{ROOT, Rank};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("topk-select");

    let rest = args.get(1..).unwrap_or(&[]);

    let config = match RunConfig::from_args(rest) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("{}", usage(program));
            if let Some((rank, peers)) = recover_tcp_rank(rest) {
                abort_group(rank, peers, &format!("{:#}", e)).await;
            }
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match &config.topology {
        Topology::Local { ranks } => run_local(&config, *ranks).await,
        Topology::Tcp { rank, peers } => run_tcp(&config, *rank, peers.clone()).await,
    };

    match outcome {
        Ok(Some(report)) => present(&report, config.json)?,
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run_local(config: &RunConfig, ranks: usize) -> anyhow::Result<Option<PipelineReport>> {
    let count = config.parse_count()?;
    tracing::info!("Running {} ranks in-process over {} molecules", ranks, count);

    let report = run_local_group(count, ranks, config.seed).await?;
    Ok(Some(report))
}

async fn run_tcp(
    config: &RunConfig,
    rank: Rank,
    peers: Vec<SocketAddr>,
) -> anyhow::Result<Option<PipelineReport>> {
    let comm = TcpCommunicator::bind(rank, peers).await?;

    let source = if rank == ROOT {
        match config.parse_count() {
            Ok(count) => {
                tracing::info!("Generating {} molecules", count);
                Some(generate_data(count, config.seed))
            }
            Err(e) => {
                comm.abort(&format!("{:#}", e)).await;
                return Err(e);
            }
        }
    } else {
        None
    };

    match pipeline::run(&comm, source).await {
        Ok(report) => Ok(report.result.is_some().then_some(report)),
        Err(e) => {
            if !is_group_abort(&e) {
                comm.abort(&format!("{:#}", e)).await;
            }
            Err(e)
        }
    }
}

/// Tells the rest of a TCP group to stop when this rank cannot take part.
async fn abort_group(rank: Rank, peers: Vec<SocketAddr>, reason: &str) {
    match TcpCommunicator::bind(rank, peers).await {
        Ok(comm) => comm.abort(reason).await,
        Err(e) => eprintln!("Error: could not reach the group to abort it: {:#}", e),
    }
}

fn present(report: &PipelineReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let Some(result) = &report.result else {
        return Ok(());
    };

    println!(
        "Top {} of {} molecules (run {})",
        result.len(),
        report.header.total,
        report.header.run_id.0
    );
    for (position, molecule) in result.iter().enumerate() {
        println!(
            "{:>5}  id={:<12} score={:.6}",
            position + 1,
            molecule.id.0,
            molecule.score
        );
    }
    println!(
        "Rank {} timings: distribute {:?}, reduce {:?}, merge {:?}",
        report.rank, report.timings.distribute, report.timings.reduce, report.timings.merge
    );

    Ok(())
}

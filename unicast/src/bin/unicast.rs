//! Interactive process of a delayed unicast topology.
//!
//! Run one instance per process listed in the directory file, then type
//! `send <pid> <message>` to send a message or `q` to quit.

use anyhow::{Context as _, Result};
use clap::Parser;
use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use unicast::{
    Command, Delivery, ProcessId, Topology, UnicastConfiguration, UnicastContext,
    defaults::{
        DEFAULT_CONFIG_PATH, DEFAULT_MAX_FRAME_LENGTH, DEFAULT_READ_TIMEOUT,
        DEFAULT_TRANSMIT_TIMEOUT,
    },
};
use unicast_core::time::Duration;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// identifier of this process in the directory file
    pid: ProcessId,

    /// the directory file: delay bounds then one `pid host port` per line
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// seed the delay sampling for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// bound on connecting to a peer and writing one message (e.g. `5s`)
    #[arg(long, default_value_t = Duration::from(DEFAULT_TRANSMIT_TIMEOUT))]
    transmit_timeout: Duration,

    /// bound on reading one inbound message (e.g. `30s`)
    #[arg(long, default_value_t = Duration::from(DEFAULT_READ_TIMEOUT))]
    read_timeout: Duration,

    /// largest message accepted or sent, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LENGTH)]
    max_frame_length: usize,
}

impl Args {
    fn configuration(&self) -> UnicastConfiguration {
        UnicastConfiguration {
            seed: self.seed,
            transmit_timeout: self.transmit_timeout.into_duration(),
            read_timeout: self.read_timeout.into_duration(),
            max_frame_length: self.max_frame_length,
            ..UnicastConfiguration::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let topology = Topology::load(&args.config)
        .with_context(|| format!("Failed to load the directory `{}'", args.config.display()))?;
    let context = UnicastContext::new(topology, args.pid, args.configuration(), print_delivery)
        .await
        .with_context(|| format!("Failed to start process {}", args.pid))?;

    println!("Process {}", args.pid);

    let queue = context.queue();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from the standard input")?
    {
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Send { to, message }) => match queue.enqueue(to, message.as_bytes()) {
                Ok(delay) => println!(
                    "Sent {message} to process {to}, release in {}, system time is {}",
                    Duration::from(delay),
                    system_time_millis(SystemTime::now()),
                ),
                Err(error) => warn!(%error, "message not sent"),
            },
            Err(unicast::CommandError::Empty) => {}
            Err(error) => warn!(%error, "invalid command"),
        }
    }

    let stats = context.shutdown().await?;
    info!(
        enqueued = stats.enqueued,
        delivered = stats.delivered,
        failed = stats.failed,
        dropped_on_shutdown = stats.dropped_on_shutdown,
        "bye"
    );

    Ok(())
}

fn print_delivery(delivery: Delivery) {
    println!(
        "Received {} from process {}, system time is {}",
        String::from_utf8_lossy(&delivery.payload),
        delivery.from,
        system_time_millis(delivery.received_at),
    );
}

/// milliseconds since the unix epoch
fn system_time_millis(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

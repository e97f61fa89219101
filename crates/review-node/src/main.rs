//! `review-node`: mint and decode review IDs, and drive the coalescing
//! listing read path against a local document set.

mod node;

use clap::Parser;
use node::config::{CliArgs, Command, NodeConfig};
use node::telemetry::init_tracing;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = NodeConfig::try_from(args)?;

    init_tracing()?;
    log_startup_info(&config);

    let mut stdout = std::io::stdout().lock();
    match &config.command {
        Command::Mint { count } => node::ids::mint(&config, *count, &mut stdout),
        Command::Decode { id } => node::ids::decode(*id, &mut stdout),
        Command::List(list) => node::list::run(&config, list, &mut stdout).await,
    }
}

fn log_startup_info(config: &NodeConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting review node with full config: {:#?}", config);
    } else {
        tracing::debug!(
            worker_id = config.worker_id,
            datacenter_id = config.datacenter_id,
            "Starting review node"
        );
    }
}

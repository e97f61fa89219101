use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use review_cache::{CacheKey, PageReaderConfig};
use review_id::SnowflakeId;

/// Command-line and environment configuration for `review-node`.
///
/// Every global setting can come from the environment (or a `.env` file in
/// the working directory) so the same binary runs unchanged across replicas;
/// only `WORKER_ID` and `DATACENTER_ID` differ between them.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "review-node",
    version,
    about = "Mint review IDs and list store reviews through the coalescing cache"
)]
pub struct CliArgs {
    /// Worker ID embedded in minted IDs, unique within a datacenter.
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, env = "WORKER_ID", default_value_t = 0)]
    pub worker_id: i64,

    /// Datacenter ID embedded in minted IDs.
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID", default_value_t = 0)]
    pub datacenter_id: i64,

    /// Expiry of listing pages written to the cache, in seconds.
    ///
    /// Environment variable: `CACHE_TTL_SECS`
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// First field of every listing cache key.
    ///
    /// Environment variable: `REVIEW_NAMESPACE`
    #[arg(long, env = "REVIEW_NAMESPACE", default_value_t = String::from("review"))]
    pub namespace: String,

    /// Search index queried on a cache miss.
    ///
    /// Environment variable: `REVIEW_INDEX`
    #[arg(long, env = "REVIEW_INDEX", default_value_t = String::from("review"))]
    pub index: String,

    /// Document field holding the store ID.
    ///
    /// Environment variable: `PARTITION_FIELD`
    #[arg(long, env = "PARTITION_FIELD", default_value_t = String::from("store_id"))]
    pub partition_field: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Mint new IDs and print them with their decoded fields.
    Mint {
        /// How many IDs to mint.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Print the fields packed into an existing ID.
    Decode {
        id: i64,
    },
    /// List one page of a store's reviews with concurrent identical callers.
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// JSON-lines file of review documents to index in memory.
    #[arg(long)]
    pub docs: PathBuf,

    #[arg(long)]
    pub store: i64,

    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    #[arg(long, default_value_t = 10)]
    pub limit: u32,

    /// Number of identical listing calls issued at once.
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub worker_id: i64,
    pub datacenter_id: i64,
    pub reader: PageReaderConfig,
    pub command: Command,
}

impl TryFrom<CliArgs> for NodeConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let max_worker_id = SnowflakeId::max_worker_id();
        if !(0..=max_worker_id).contains(&args.worker_id) {
            bail!(
                "WORKER_ID ({}) is outside the Snowflake worker ID space [0, {}]",
                args.worker_id,
                max_worker_id
            );
        }

        let max_datacenter_id = SnowflakeId::max_datacenter_id();
        if !(0..=max_datacenter_id).contains(&args.datacenter_id) {
            bail!(
                "DATACENTER_ID ({}) is outside the Snowflake datacenter ID space [0, {}]",
                args.datacenter_id,
                max_datacenter_id
            );
        }

        if args.cache_ttl_secs == 0 {
            bail!("CACHE_TTL_SECS must be greater than 0");
        }

        CacheKey::new(args.namespace.as_str(), 0, 0, 0)
            .with_context(|| format!("invalid REVIEW_NAMESPACE {:?}", args.namespace))?;

        if matches!(&args.command, Command::List(list) if list.concurrency == 0) {
            bail!("--concurrency must be greater than 0");
        }

        let reader = PageReaderConfig::default()
            .with_namespace(args.namespace)
            .with_index(args.index)
            .with_partition_field(args.partition_field)
            .with_ttl(Duration::from_secs(args.cache_ttl_secs));

        Ok(Self {
            worker_id: args.worker_id,
            datacenter_id: args.datacenter_id,
            reader,
            command: args.command,
        })
    }
}
